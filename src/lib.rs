//! # ccg-gym
//!
//! Step-oriented episode environment for choice-driven card game engines.
//!
//! ## Design Principles
//!
//! 1. **Engine keeps its call stack**: the engine runs on its own thread and
//!    asks for every decision through a blocking `Decider::decide`. The
//!    bridge turns each call into an externally answerable prompt.
//!
//! 2. **One prompt at a time**: a single-slot rendezvous with a monotonic
//!    generation counter. Decisions quoting an old generation are rejected
//!    and never touch the episode.
//!
//! 3. **Stable indices**: priority choices are indexed in a fixed order
//!    (hand, then battlefield, then pass). Any index past the end means pass.
//!
//! 4. **Always releasable**: timeouts and teardown answer pending prompts
//!    with safe defaults, so an engine thread never stays blocked.
//!
//! ## Modules
//!
//! - `core`: ids, seats, RNG, match and bridge configuration
//! - `rules`: the engine contract (queries, answers, views)
//! - `catalog`: action catalog indexer
//! - `bridge`: decision bridge and prompt/decision wire types
//! - `episode`: episode controller, registry, snapshots, transcripts
//! - `channels`: policies, embedded driver, remote callout, HTTP surface
//! - `observe`: observation encoding for RL policies
//! - `games`: reference duel engine
//! - `python`: gym-style bindings (feature `python`)

pub mod core;
pub mod error;
pub mod rules;
pub mod catalog;
pub mod bridge;
pub mod episode;
pub mod channels;
pub mod observe;
pub mod games;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::{
    BridgeSettings, EpisodeId, GameRng, MatchConfig, ObjectId, PlayerId, PlayerMap, SeatConfig,
    SeatControl,
};

pub use crate::error::{ChannelFault, EngineFault, EnvError, LifecycleError, ProtocolError};

pub use crate::rules::{
    Answer, Decider, Engine, EngineFactory, GameView, MatchResult, Phase, PlayChoice, Query,
};

pub use crate::catalog::{ActionCatalog, ActionKind, CatalogEntry};

pub use crate::bridge::{Decision, Prompt, PromptKind, PromptOption, Responder, Selection};

pub use crate::episode::{
    EpisodeController, EpisodeRegistry, Resolution, StateSnapshot, Transcript, Transition, Winner,
};

pub use crate::channels::{Autopilot, EmbeddedDriver, Passive, Policy, PolicyResponder, RandomPolicy};

pub use crate::observe::{EncodedObservation, FlatEncoder, ObservationEncoder};

pub use crate::games::{DuelEngine, DuelFactory};
