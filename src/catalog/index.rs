//! Deterministic indexing of priority choices.
//!
//! ## Ordering
//!
//! 1. Choices from the acting player's hand, in hand order
//! 2. Choices from their battlefield, in battlefield order, then by ability
//! 3. Exactly one trailing pass
//!
//! Choices are sorted by `(zone, position, ability)` before indexing, so the
//! catalog does not depend on the order the engine enumerated them in. Ties
//! keep the engine's order.
//!
//! ## Overflow collapse
//!
//! Any index at or beyond the catalog length resolves to the last entry,
//! which is always pass. Fixed-size action spaces can therefore submit any
//! index and never hit an out-of-range error.

use crate::rules::{Answer, PlayChoice};

use super::entry::CatalogEntry;

/// The ordered, indexed action list of one priority prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionCatalog {
    entries: Vec<CatalogEntry>,
}

impl ActionCatalog {
    /// Build the catalog for a set of legal choices.
    ///
    /// ```
    /// use ccg_gym::catalog::{ActionCatalog, ActionKind};
    /// use ccg_gym::core::ObjectId;
    /// use ccg_gym::rules::PlayChoice;
    ///
    /// let choices = vec![
    ///     PlayChoice::activate(ObjectId(9), "Pyromancer", 0, 0, "deal 1 damage"),
    ///     PlayChoice::play_land(ObjectId(4), "Forest", 2),
    /// ];
    /// let catalog = ActionCatalog::build(&choices);
    ///
    /// assert_eq!(catalog.len(), 3);
    /// assert_eq!(catalog.entries()[0].kind, ActionKind::PlayPermanent);
    /// assert_eq!(catalog.entries()[1].kind, ActionKind::Activate);
    /// assert!(catalog.resolve(99).is_pass());
    /// ```
    #[must_use]
    pub fn build(choices: &[PlayChoice]) -> Self {
        let mut order: Vec<usize> = (0..choices.len()).collect();
        order.sort_by_key(|&i| {
            let c = &choices[i];
            (c.zone, c.position, c.ability)
        });

        let mut entries: Vec<CatalogEntry> = order
            .into_iter()
            .enumerate()
            .map(|(index, position)| CatalogEntry::from_choice(index, &choices[position], position))
            .collect();
        entries.push(CatalogEntry::pass(entries.len()));

        Self { entries }
    }

    /// Number of entries, including the trailing pass. Never 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: every catalog holds at least the pass entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Index of the pass entry.
    #[must_use]
    pub fn pass_index(&self) -> usize {
        self.entries.len() - 1
    }

    /// Entry for a submitted index, collapsing overflow onto pass.
    #[must_use]
    pub fn resolve(&self, index: usize) -> &CatalogEntry {
        &self.entries[index.min(self.pass_index())]
    }

    /// Engine answer for a submitted index.
    #[must_use]
    pub fn answer(&self, index: usize) -> Answer {
        match self.resolve(index).choice {
            Some(position) => Answer::Play(position),
            None => Answer::Pass,
        }
    }
}
