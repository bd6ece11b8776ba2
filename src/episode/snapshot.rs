//! Read-only episode snapshots.

use serde::{Deserialize, Serialize};

use crate::bridge::PromptKind;
use crate::core::{EpisodeId, PlayerId};
use crate::rules::{GameView, Phase};

/// Final outcome of an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Player(PlayerId),
    /// Draw or turn limit.
    Nobody,
    /// Engine fault, teardown or exhausted fault budget.
    Aborted,
}

/// Everything observable about an episode at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub episode: EpisodeId,
    /// Generation of the most recently published prompt.
    pub generation: u64,
    pub turn: u32,
    pub phase: Phase,
    pub active: PlayerId,
    pub priority: Option<PlayerId>,
    pub terminal: bool,
    /// Ended by the turn limit.
    pub truncated: bool,
    /// Set once terminal.
    pub winner: Option<Winner>,
    /// Kind of the prompt awaiting a decision.
    pub awaiting: PromptKind,
    pub awaiting_player: Option<PlayerId>,
    /// Prompts resolved by decision timeout so far.
    pub timeouts: u32,
    /// Why the episode aborted, when it did.
    pub fault: Option<String>,
    pub view: GameView,
}

/// Result of `reset` and `step`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub snapshot: StateSnapshot,
    /// The call's deadline expired or a prompt was resolved by timeout
    /// while it ran.
    pub timed_out: bool,
}

impl Transition {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.snapshot.terminal
    }
}
