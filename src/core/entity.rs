//! Identifiers for game objects and episodes.
//!
//! ## ObjectId
//!
//! Every card the engine creates for a match gets a unique `ObjectId`.
//! Ids are stable for the lifetime of the match, across zone changes.
//!
//! ## EpisodeId
//!
//! Every episode hosted by a registry (or a standalone controller) gets a
//! unique `EpisodeId`. Ids are never reused within a process.
//!
//! ```
//! use ccg_gym::core::{EpisodeId, ObjectId};
//!
//! let card = ObjectId(12);
//! assert_eq!(format!("{}", card), "#12");
//!
//! let episode = EpisodeId::new(3);
//! assert_eq!(episode.raw(), 3);
//! ```

use serde::{Deserialize, Serialize};

/// Identifier of a game object (card, permanent, spell).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a hosted episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(u64);

impl EpisodeId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EpisodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}
