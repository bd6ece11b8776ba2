//! Engine-facing contract.
//!
//! Engines implement [`Engine`] and call a [`Decider`] whenever a player
//! must choose. Everything the rest of the crate knows about a match flows
//! through the types here: queries, answers and the public [`GameView`].

pub mod engine;
pub mod query;
pub mod view;

pub use engine::{Decider, Engine, EngineFactory, MatchResult};
pub use query::{Answer, Candidate, PlayChoice, PlayKind, Purpose, Query, Target, Zone};
pub use view::{CardView, GameView, Phase, PlayerView};
