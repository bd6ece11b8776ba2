//! Embedded channel: answer prompts with an in-process [`Policy`].
//!
//! Two flavors:
//!
//! - [`PolicyResponder`] attaches a policy to a controller as its responder,
//!   so the engine thread answers every prompt itself
//! - [`EmbeddedDriver`] plays a whole episode through the polled API
//!   (`valid_actions` then `step`), the same way an external actor would

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bridge::{Prompt, PromptKind, Responder, Selection};
use crate::core::MatchConfig;
use crate::episode::{EpisodeController, Winner};
use crate::error::{ChannelFault, EnvError, ProtocolError};
use crate::rules::GameView;

use super::policy::Policy;

/// Adapts a [`Policy`] to the [`Responder`] interface.
#[derive(Clone, Debug, Default)]
pub struct PolicyResponder<P> {
    policy: P,
}

impl<P: Policy> PolicyResponder<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    pub fn into_inner(self) -> P {
        self.policy
    }
}

impl<P: Policy> Responder for PolicyResponder<P> {
    fn respond(&mut self, view: &GameView, prompt: &Prompt) -> Result<Selection, ChannelFault> {
        Ok(self.policy.decide(view, prompt))
    }
}

/// Summary of one driven episode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub winner: Option<Winner>,
    pub truncated: bool,
    /// Decisions accepted by the controller.
    pub steps: usize,
    /// Decisions rejected as stale or illegal.
    pub rejected: usize,
    pub turns: u32,
}

/// Drives an episode to completion with a policy.
pub struct EmbeddedDriver<'a> {
    controller: &'a EpisodeController,
    deadline: Option<Duration>,
    max_steps: usize,
}

impl<'a> EmbeddedDriver<'a> {
    pub fn new(controller: &'a EpisodeController) -> Self {
        Self {
            controller,
            deadline: None,
            max_steps: 10_000,
        }
    }

    /// Per-call wait bound passed to `reset` and `step`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop submitting after this many decisions. The episode keeps its
    /// state and can still be stepped by hand.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Reset with `config` and answer every prompt with `policy` until the
    /// episode ends or the step cap is hit.
    ///
    /// A call that runs past the deadline does not end the run: the driver
    /// waits for the engine's next prompt and carries on.
    pub fn play(&self, config: MatchConfig, policy: &mut dyn Policy) -> Result<EpisodeReport, EnvError> {
        let mut transition = self.controller.reset(config, self.deadline)?;
        let mut steps = 0;
        let mut rejected = 0;

        while !transition.is_terminal() && steps < self.max_steps {
            if transition.snapshot.awaiting == PromptKind::None {
                transition = self.controller.await_prompt(self.deadline)?;
                continue;
            }
            let prompt = match self.controller.valid_actions() {
                Ok(prompt) => prompt,
                // Resolved by a decision timeout since the last snapshot.
                Err(EnvError::Protocol(ProtocolError::NoPendingPrompt | ProtocolError::Terminal)) => {
                    transition = self.controller.await_prompt(self.deadline)?;
                    continue;
                }
                Err(err) => return Err(err),
            };
            let selection = policy.decide(&transition.snapshot.view, &prompt);
            transition = match self.controller.step(prompt.decide(selection), self.deadline) {
                Ok(next) => next,
                Err(EnvError::Protocol(
                    ProtocolError::Stale { .. } | ProtocolError::NoPendingPrompt | ProtocolError::Terminal,
                )) => {
                    rejected += 1;
                    transition = self.controller.await_prompt(self.deadline)?;
                    continue;
                }
                Err(EnvError::Protocol(err)) => {
                    log::debug!(
                        "[episode {}] policy decision rejected: {}",
                        self.controller.id(),
                        err
                    );
                    rejected += 1;
                    self.controller
                        .step(prompt.decide(prompt.default_selection()), self.deadline)?
                }
                Err(err) => return Err(err),
            };
            steps += 1;
        }

        Ok(EpisodeReport {
            winner: transition.snapshot.winner,
            truncated: transition.snapshot.truncated,
            steps,
            rejected,
            turns: transition.snapshot.turn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{Autopilot, Passive};

    #[test]
    fn test_policy_responder_answers_with_policy() {
        let prompt = Prompt {
            kind: crate::bridge::PromptKind::BinaryChoice,
            fallback: Some(true),
            min: 1,
            max: 1,
            ..Prompt::default()
        };
        let mut responder = PolicyResponder::new(Passive);
        assert_eq!(
            responder.respond(&GameView::default(), &prompt),
            Ok(Selection::Boolean(true))
        );
        let _autopilot: Autopilot = PolicyResponder::new(Autopilot).into_inner();
    }
}
