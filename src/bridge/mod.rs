//! Decision bridge.
//!
//! Converts the engine's blocking decision calls into externally answerable
//! prompts and resumes the engine exactly once per matching decision.
//!
//! ## Halves
//!
//! - [`DecisionBridge`]: runs on the engine thread as its `Decider`
//! - the shared slot: consumer-facing rendezvous used by the episode
//!   controller (`submit`, `wait_settled`, `halt`, `snapshot`)
//!
//! ## Consumers
//!
//! Exactly one consumer answers prompts at a time: either polled decisions
//! submitted through the controller, or an attached [`Responder`].

pub mod decider;
pub mod prompt;
pub(crate) mod resolver;
pub mod responder;
pub(crate) mod slot;

pub use decider::DecisionBridge;
pub use prompt::{Decision, Prompt, PromptKind, PromptOption, Selection};
pub use responder::{Attachments, Responder};
