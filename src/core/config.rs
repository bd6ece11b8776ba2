//! Configuration types.
//!
//! - `MatchConfig`: what match an episode plays (seed, seats, rules knobs).
//!   Serializable, so it doubles as the body of a reset request.
//! - `BridgeSettings`: how the decision bridge treats slow or absent
//!   decision makers. Process-level, not per match.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Who answers the decisions of a seat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatControl {
    /// Decisions are exposed as prompts to the external actor.
    #[default]
    Agent,
    /// Decisions are answered in-process by the built-in autopilot and are
    /// never exposed.
    Autopilot,
}

/// One side of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatConfig {
    /// Display name.
    pub name: String,

    /// Deck preset name, resolved by the engine factory.
    pub deck: String,

    #[serde(default)]
    pub control: SeatControl,
}

impl SeatConfig {
    pub fn new(name: impl Into<String>, deck: impl Into<String>, control: SeatControl) -> Self {
        Self {
            name: name.into(),
            deck: deck.into(),
            control,
        }
    }

    /// An externally controlled seat.
    pub fn agent(name: impl Into<String>, deck: impl Into<String>) -> Self {
        Self::new(name, deck, SeatControl::Agent)
    }

    /// A seat played by the built-in autopilot.
    pub fn autopilot(name: impl Into<String>, deck: impl Into<String>) -> Self {
        Self::new(name, deck, SeatControl::Autopilot)
    }
}

/// Match configuration passed to the engine factory on every reset.
///
/// The default is one agent seat against one autopilot seat, matching the
/// usual training setup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Seed for every random choice the engine makes.
    pub seed: u64,

    /// Seats of the match; the engine decides who starts.
    pub seats: Vec<SeatConfig>,

    pub starting_life: i32,

    /// Opening hand size.
    pub hand_size: usize,

    /// Cards kept at cleanup; excess is discarded.
    pub max_hand_size: usize,

    /// Turn limit after which the match ends truncated. 0 = unlimited.
    pub max_turns: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            seats: vec![
                SeatConfig::agent("Agent", "midrange"),
                SeatConfig::autopilot("Autopilot", "midrange"),
            ],
            starting_life: 20,
            hand_size: 7,
            max_hand_size: 7,
            max_turns: 50,
        }
    }
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_seats(mut self, seats: Vec<SeatConfig>) -> Self {
        self.seats = seats;
        self
    }

    /// Replace the configuration of one seat.
    ///
    /// Out-of-range seats are ignored; the factory validates seat counts.
    pub fn with_seat(mut self, index: usize, seat: SeatConfig) -> Self {
        if let Some(slot) = self.seats.get_mut(index) {
            *slot = seat;
        }
        self
    }

    /// Put every seat under external control.
    pub fn with_all_agents(mut self) -> Self {
        for seat in &mut self.seats {
            seat.control = SeatControl::Agent;
        }
        self
    }

    /// Put every seat under autopilot.
    pub fn with_all_autopilot(mut self) -> Self {
        for seat in &mut self.seats {
            seat.control = SeatControl::Autopilot;
        }
        self
    }

    pub fn with_starting_life(mut self, life: i32) -> Self {
        self.starting_life = life;
        self
    }

    pub fn with_hand_size(mut self, size: usize) -> Self {
        self.hand_size = size;
        self
    }

    pub fn with_max_hand_size(mut self, size: usize) -> Self {
        self.max_hand_size = size;
        self
    }

    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }

    /// Control mode of a seat; seats beyond the configured list are agents.
    #[must_use]
    pub fn control(&self, seat: usize) -> SeatControl {
        self.seats.get(seat).map(|s| s.control).unwrap_or_default()
    }
}

/// Timing and fault policy of a decision bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeSettings {
    /// How long a published prompt may stay unanswered before the default
    /// decision is injected. `None` waits indefinitely.
    pub decision_timeout: Option<Duration>,

    /// How long teardown waits for the engine thread to unwind.
    pub teardown_grace: Duration,

    /// Consecutive timeouts or responder failures after which the episode
    /// is aborted. 0 disables the budget.
    pub max_consecutive_faults: u32,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            decision_timeout: None,
            teardown_grace: Duration::from_secs(5),
            max_consecutive_faults: 0,
        }
    }
}

impl BridgeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = Some(timeout);
        self
    }

    pub fn with_teardown_grace(mut self, grace: Duration) -> Self {
        self.teardown_grace = grace;
        self
    }

    pub fn with_max_consecutive_faults(mut self, faults: u32) -> Self {
        self.max_consecutive_faults = faults;
        self
    }
}
