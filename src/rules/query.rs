//! Decision queries the engine asks and the answers it expects back.
//!
//! Every rules question (priority action, targets, attackers, blockers,
//! discards, mulligans, optional triggers) is one variant of the closed
//! [`Query`] enum, dispatched through a single `Decider::decide` call.
//!
//! Indices in an [`Answer`] always refer to the lists inside the query as
//! the engine built them.

use serde::{Deserialize, Serialize};

use crate::core::{ObjectId, PlayerId};

/// Zone a priority choice originates from.
///
/// Declaration order is catalog order: hand before battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Hand,
    Battlefield,
}

/// What taking a priority choice does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayKind {
    /// Put a land onto the battlefield.
    PlayLand,
    /// Cast a spell from hand.
    Cast,
    /// Activate an ability of a permanent.
    Activate,
}

/// One thing the priority player may do instead of passing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayChoice {
    pub kind: PlayKind,
    pub zone: Zone,
    /// Position of the source card within its zone.
    pub position: usize,
    /// Ability index on the source; 0 for plays and casts.
    pub ability: u8,
    pub object: ObjectId,
    pub name: String,
    /// Ability text for activations.
    pub detail: Option<String>,
}

impl PlayChoice {
    pub fn play_land(object: ObjectId, name: impl Into<String>, position: usize) -> Self {
        Self {
            kind: PlayKind::PlayLand,
            zone: Zone::Hand,
            position,
            ability: 0,
            object,
            name: name.into(),
            detail: None,
        }
    }

    pub fn cast(object: ObjectId, name: impl Into<String>, position: usize) -> Self {
        Self {
            kind: PlayKind::Cast,
            zone: Zone::Hand,
            position,
            ability: 0,
            object,
            name: name.into(),
            detail: None,
        }
    }

    pub fn activate(
        object: ObjectId,
        name: impl Into<String>,
        position: usize,
        ability: u8,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind: PlayKind::Activate,
            zone: Zone::Battlefield,
            position,
            ability,
            object,
            name: name.into(),
            detail: Some(text.into()),
        }
    }
}

/// Something a selection can point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Object(ObjectId),
    Player(PlayerId),
}

/// One selectable candidate of a [`Query::Select`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub target: Target,
    pub label: String,
}

impl Candidate {
    pub fn object(id: ObjectId, label: impl Into<String>) -> Self {
        Self {
            target: Target::Object(id),
            label: label.into(),
        }
    }

    pub fn player(id: PlayerId, label: impl Into<String>) -> Self {
        Self {
            target: Target::Player(id),
            label: label.into(),
        }
    }
}

/// Why the engine is asking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Purpose {
    /// Main-phase priority: act or pass.
    Priority,
    /// Targets for a spell or ability.
    Targets { source: ObjectId },
    Attackers,
    Blockers { attacker: ObjectId },
    /// Discard down to maximum hand size.
    Discard,
    /// Keep the opening hand?
    Mulligan,
    /// Use an optional triggered ability?
    OptionalTrigger { source: ObjectId },
}

/// A decision the engine needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Choose an action or pass priority.
    Priority {
        player: PlayerId,
        choices: Vec<PlayChoice>,
    },
    /// Choose between `min` and `max` distinct candidates.
    Select {
        player: PlayerId,
        purpose: Purpose,
        text: String,
        candidates: Vec<Candidate>,
        min: usize,
        max: usize,
    },
    /// Yes or no. `fallback` is the answer used when nobody answers.
    Confirm {
        player: PlayerId,
        purpose: Purpose,
        text: String,
        fallback: bool,
    },
}

impl Query {
    /// The player who must answer.
    #[must_use]
    pub fn player(&self) -> PlayerId {
        match self {
            Query::Priority { player, .. }
            | Query::Select { player, .. }
            | Query::Confirm { player, .. } => *player,
        }
    }

    #[must_use]
    pub fn purpose(&self) -> Purpose {
        match self {
            Query::Priority { .. } => Purpose::Priority,
            Query::Select { purpose, .. } | Query::Confirm { purpose, .. } => *purpose,
        }
    }
}

/// The decider's reply to a [`Query`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    /// Pass priority.
    Pass,
    /// Take `choices[i]` of a priority query.
    Play(usize),
    /// Selected candidate positions of a select query.
    Selection(Vec<usize>),
    /// Reply to a confirm query.
    Binary(bool),
}
