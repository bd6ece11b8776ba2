//! Python bindings for the ccg-gym environment.
//!
//! # Quick Start
//!
//! ```python
//! import ccg_gym
//!
//! env = ccg_gym.DuelEnv(agent_deck="aggro", opponent_deck="control")
//! obs, info = env.reset(seed=42)
//! done = False
//! while not done:
//!     mask = env.action_mask()
//!     action = max(i for i, live in enumerate(mask) if live)  # pass
//!     obs, reward, terminated, truncated, info = env.step(action)
//!     done = terminated or truncated
//! ```

use pyo3::prelude::*;

mod py_env;

pub use py_env::*;

/// ccg_gym: decision bridge and episode control for card duels.
#[pymodule]
fn ccg_gym(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDuelEnv>()?;
    Ok(())
}
