//! Catalog entries: one indexable action each.
//!
//! An entry is a kind (the "verb") plus the objects it refers to (the
//! "nouns"), with a stable index and a readable description:
//! - "Pass priority" = kind only, no objects
//! - "Play Forest" = kind + the land
//! - "Activate Prodigal Pyromancer: ..." = kind + the permanent

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::ObjectId;
use crate::rules::{PlayChoice, PlayKind};

/// What an entry does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Put a land (permanent) onto the battlefield.
    PlayPermanent,
    Cast,
    Activate,
    Pass,
}

impl From<PlayKind> for ActionKind {
    fn from(kind: PlayKind) -> Self {
        match kind {
            PlayKind::PlayLand => ActionKind::PlayPermanent,
            PlayKind::Cast => ActionKind::Cast,
            PlayKind::Activate => ActionKind::Activate,
        }
    }
}

/// One indexable action of a priority prompt.
///
/// ```
/// use ccg_gym::catalog::{ActionKind, CatalogEntry};
///
/// let pass = CatalogEntry::pass(3);
/// assert_eq!(pass.index, 3);
/// assert_eq!(pass.kind, ActionKind::Pass);
/// assert!(pass.objects.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// 0-based position in the catalog.
    pub index: usize,

    pub kind: ActionKind,

    /// Objects the action refers to. Empty for pass.
    pub objects: SmallVec<[ObjectId; 2]>,

    pub description: String,

    /// Position of the originating choice in the engine's query.
    #[serde(skip)]
    pub(crate) choice: Option<usize>,
}

impl CatalogEntry {
    /// The trailing pass entry.
    #[must_use]
    pub fn pass(index: usize) -> Self {
        Self {
            index,
            kind: ActionKind::Pass,
            objects: SmallVec::new(),
            description: "Pass priority".to_string(),
            choice: None,
        }
    }

    pub(crate) fn from_choice(index: usize, choice: &PlayChoice, position: usize) -> Self {
        let description = match (choice.kind, &choice.detail) {
            (PlayKind::PlayLand, _) => format!("Play {}", choice.name),
            (PlayKind::Cast, _) => format!("Cast {}", choice.name),
            (PlayKind::Activate, Some(text)) => format!("Activate {}: {}", choice.name, text),
            (PlayKind::Activate, None) => format!("Activate {}", choice.name),
        };
        Self {
            index,
            kind: choice.kind.into(),
            objects: SmallVec::from_slice(&[choice.object]),
            description,
            choice: Some(position),
        }
    }

    /// Position of the originating choice in the engine's query; `None`
    /// for pass.
    #[must_use]
    pub fn choice(&self) -> Option<usize> {
        self.choice
    }

    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.kind == ActionKind::Pass
    }
}
