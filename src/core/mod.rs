//! Core types shared by every layer: ids, seats, RNG, configuration.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;

pub use entity::{EpisodeId, ObjectId};
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
pub use config::{BridgeSettings, MatchConfig, SeatConfig, SeatControl};
