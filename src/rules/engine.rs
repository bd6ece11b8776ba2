//! Engine contract.
//!
//! A rules engine runs a whole match on its own thread and calls back into a
//! [`Decider`] whenever a player must choose. The decider answers
//! synchronously; the engine never sees how the answer was obtained.
//!
//! - `Engine::run`: play the match to completion, asking the decider
//! - `Engine::view`: public state, readable before, during and after a run
//! - `EngineFactory::create`: build an engine for a [`MatchConfig`]

use serde::{Deserialize, Serialize};

use crate::core::{MatchConfig, PlayerId};
use crate::error::EngineFault;

use super::query::{Answer, Query};
use super::view::GameView;

/// How a match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    /// Single winner.
    Winner(PlayerId),
    /// Both sides lost at the same time.
    Draw,
    /// The turn limit was reached.
    Truncated,
    /// The engine stopped because its decider halted.
    Aborted,
}

impl MatchResult {
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, MatchResult::Winner(p) if *p == player)
    }
}

/// Answers the engine's decision queries.
///
/// Implementations must always return an answer that is legal for the
/// query, including after [`Decider::halted`] turned true.
pub trait Decider {
    /// Answer one query. `view` is the public state at the time of asking.
    fn decide(&mut self, view: &GameView, query: &Query) -> Answer;

    /// Whether the engine should stop at its next opportunity.
    ///
    /// Engines poll this between steps and return [`MatchResult::Aborted`].
    fn halted(&self) -> bool {
        false
    }
}

/// A rules engine instance for one match.
pub trait Engine: Send {
    /// Play the match to its end.
    fn run(&mut self, decider: &mut dyn Decider) -> Result<MatchResult, EngineFault>;

    /// Current public state.
    fn view(&self) -> GameView;
}

/// Builds engines for match configurations.
pub trait EngineFactory: Send + Sync {
    /// Validate `config` and create an engine ready to `run`.
    fn create(&self, config: &MatchConfig) -> Result<Box<dyn Engine>, EngineFault>;
}

impl<F> EngineFactory for F
where
    F: Fn(&MatchConfig) -> Result<Box<dyn Engine>, EngineFault> + Send + Sync,
{
    fn create(&self, config: &MatchConfig) -> Result<Box<dyn Engine>, EngineFault> {
        self(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_is_winner() {
        let result = MatchResult::Winner(PlayerId::new(1));
        assert!(!result.is_winner(PlayerId::new(0)));
        assert!(result.is_winner(PlayerId::new(1)));
        assert!(!MatchResult::Draw.is_winner(PlayerId::new(0)));
        assert!(!MatchResult::Truncated.is_winner(PlayerId::new(0)));
    }
}
