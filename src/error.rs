//! Error types.
//!
//! Errors are split by who caused them and what they cost:
//!
//! - [`ProtocolError`]: the external actor sent something unusable. The
//!   episode is untouched and the actor may retry.
//! - [`EngineFault`]: the engine failed or panicked. The episode ends,
//!   aborted.
//! - [`ChannelFault`]: a decision channel failed. Resolved by fallback;
//!   repeated faults abort the episode.
//! - [`LifecycleError`]: the controller is not in a state to serve the call.

use std::time::Duration;

use thiserror::Error;

use crate::bridge::PromptKind;
use crate::core::EpisodeId;

/// A submitted decision or request was rejected without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("stale decision: answers generation {submitted}, current generation is {current}")]
    Stale { submitted: u64, current: u64 },

    #[error("decision answers generation {submitted}, which has not been issued (current generation is {current})")]
    Premature { submitted: u64, current: u64 },

    #[error("option {index} is out of range ({options} options)")]
    OutOfRange { index: usize, options: usize },

    #[error("selected {count} options, expected between {min} and {max}")]
    SelectionCount { count: usize, min: usize, max: usize },

    #[error("option {0} selected more than once")]
    DuplicateSelection(usize),

    #[error("{prompt:?} prompt cannot be answered with {given}")]
    WrongSelection { prompt: PromptKind, given: &'static str },

    #[error("malformed decision: {0}")]
    Malformed(String),

    #[error("no decision is pending")]
    NoPendingPrompt,

    #[error("episode is terminal")]
    Terminal,

    #[error("a responder is attached, polled decisions are not accepted")]
    ResponderAttached,
}

/// The engine could not run the match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineFault {
    #[error("engine panicked: {0}")]
    Panicked(String),

    #[error("engine failed: {0}")]
    Failed(String),

    #[error("invalid match configuration: {0}")]
    Config(String),
}

/// A decision channel could not deliver a decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelFault {
    #[error("decision service unreachable: {0}")]
    Unreachable(String),

    #[error("decision service timed out after {0:?}")]
    Timeout(Duration),

    #[error("decision service returned a bad response: {0}")]
    BadResponse(String),
}

/// The controller cannot serve the call in its current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("episode has not been reset yet")]
    NotStarted,

    #[error("episode is closed")]
    Closed,

    #[error("unknown episode {0}")]
    UnknownEpisode(EpisodeId),
}

/// Umbrella error of controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Engine(#[from] EngineFault),

    #[error(transparent)]
    Channel(#[from] ChannelFault),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl EnvError {
    /// Whether the caller can retry after this error without resetting.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::Channel(_))
    }
}

pub type Result<T, E = EnvError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ProtocolError::Stale { submitted: 2, current: 3 };
        assert_eq!(
            err.to_string(),
            "stale decision: answers generation 2, current generation is 3"
        );

        let err = ProtocolError::Premature { submitted: 5, current: 3 };
        assert_eq!(
            err.to_string(),
            "decision answers generation 5, which has not been issued (current generation is 3)"
        );

        let err: EnvError = LifecycleError::UnknownEpisode(EpisodeId::new(4)).into();
        assert_eq!(err.to_string(), "unknown episode 4");
    }

    #[test]
    fn test_recoverable() {
        assert!(EnvError::from(ProtocolError::NoPendingPrompt).is_recoverable());
        assert!(!EnvError::from(EngineFault::Failed("x".into())).is_recoverable());
        assert!(!EnvError::from(LifecycleError::Closed).is_recoverable());
    }
}
