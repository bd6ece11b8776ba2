//! Decision channels: the ways an external actor can answer prompts.
//!
//! - `policy`: in-process policies (autopilot, passive, random)
//! - `embedded`: drive an episode with a policy, or attach one as responder
//! - `remote` (feature `remote`): call an HTTP decision service per prompt
//! - `http` (feature `server`): expose episodes to polling clients over HTTP
//!
//! The Python gym binding lives in `crate::python`.

pub mod embedded;
pub mod policy;

#[cfg(feature = "remote")]
pub mod remote;

#[cfg(feature = "server")]
pub mod http;

pub use embedded::{EmbeddedDriver, EpisodeReport, PolicyResponder};
pub use policy::{Autopilot, Passive, Policy, RandomPolicy};

#[cfg(feature = "remote")]
pub use remote::RemoteResponder;
