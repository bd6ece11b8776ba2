//! Rules engines that plug into the bridge through `EngineFactory`.

pub mod duel;

pub use duel::{DuelEngine, DuelFactory};
