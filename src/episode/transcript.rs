//! Ordered record of every published prompt and how it was resolved.
//!
//! Transcripts serialize with bincode. Since engines are seeded and
//! autopilot seats are deterministic, replaying a transcript's selections
//! against the same configuration reproduces the episode.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::{Decision, PromptKind, Selection};
use crate::core::{MatchConfig, PlayerId};
use crate::error::EnvError;

use super::controller::EpisodeController;
use super::snapshot::Transition;

/// How a prompt was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// Polled decision from the external actor.
    Actor,
    /// Reply of the attached responder.
    Responder,
    /// Fallback policy after a responder failure.
    Fallback,
    /// Default decision after a responder failure.
    Defaulted,
    /// Default decision after the decision timeout.
    Timeout,
    /// Default decision during teardown.
    Halted,
}

impl Resolution {
    /// Whether this resolution counts against the fault budget.
    #[must_use]
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            Resolution::Fallback | Resolution::Defaulted | Resolution::Timeout
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub generation: u64,
    pub kind: PromptKind,
    pub player: Option<PlayerId>,
    pub selection: Selection,
    pub resolution: Resolution,
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("transcript i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("transcript encoding: {0}")]
    Codec(#[from] bincode::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub config: MatchConfig,
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TranscriptError> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TranscriptError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TranscriptError> {
        Self::from_bytes(&std::fs::read(path)?)
    }

    /// Reset `controller` with the recorded configuration and resubmit every
    /// recorded selection under its recorded generation.
    ///
    /// Entries resolved during teardown are skipped. When a call runs past
    /// `deadline` the replay waits for the engine's next prompt before
    /// resubmitting. A generation mismatch surfaces as a protocol error.
    pub fn replay(
        &self,
        controller: &EpisodeController,
        deadline: Option<Duration>,
    ) -> Result<Transition, EnvError> {
        let mut transition = controller.reset(self.config.clone(), deadline)?;
        for entry in self
            .entries
            .iter()
            .filter(|e| e.resolution != Resolution::Halted)
        {
            while !transition.is_terminal() && transition.snapshot.awaiting == PromptKind::None {
                transition = controller.await_prompt(deadline)?;
            }
            let decision = Decision {
                generation: entry.generation,
                selection: entry.selection.clone(),
            };
            transition = controller.step(decision, deadline)?;
        }
        Ok(transition)
    }
}
