//! Episode control.
//!
//! - `controller`: reset / state / valid_actions / step over one match
//! - `registry`: many episodes side by side, keyed by id
//! - `snapshot`: read-only views handed to callers
//! - `transcript`: resolved prompts, persistence and replay

pub mod controller;
pub mod registry;
pub mod snapshot;
pub mod transcript;

pub use controller::EpisodeController;
pub use registry::EpisodeRegistry;
pub use snapshot::{StateSnapshot, Transition, Winner};
pub use transcript::{Resolution, Transcript, TranscriptEntry, TranscriptError};
