//! Reference two-player card duel.
//!
//! A compact rules engine that exercises every decision the bridge
//! understands:
//! - mulligan confirmations during setup
//! - main-phase priority over lands, spells and activated abilities
//! - damage targets for "any target" effects
//! - attackers, then one blocker per attacker
//! - optional enter-the-battlefield draws
//! - discard to maximum hand size during cleanup
//!
//! Decks are chosen by name (`aggro`, `control`, `midrange`); shuffles and
//! the opening coin flip derive from `MatchConfig::seed`.

mod cards;
mod game;

pub use cards::{decklist, Ability, CardDef, CardId, CardKind, CardPool, Effect, DECK_NAMES};
pub use game::{DuelEngine, DuelFactory};
