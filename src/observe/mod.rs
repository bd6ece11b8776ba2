//! Observation encoding for reinforcement-learning consumers.
//!
//! - [`ObservationEncoder`]: snapshot → tensor from one seat's perspective
//! - [`FlatEncoder`]: fixed-width feature vector for two-seat duels
//! - [`action_mask`]: which indices of a fixed action space are live

pub mod encoder;

pub use encoder::{action_mask, EncodedObservation, FlatEncoder, ObservationEncoder};
