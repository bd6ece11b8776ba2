//! The engine-facing half of the bridge.
//!
//! `DecisionBridge` is installed as the engine's [`Decider`] and runs on the
//! engine thread. For each query it either answers in-process (forced
//! choices, autopilot seats, teardown) or publishes a prompt and suspends
//! until a decision, a timeout or a halt resolves it.

use std::sync::Arc;

use crate::channels::{Autopilot, Policy};
use crate::core::{MatchConfig, PlayerId, SeatControl};
use crate::episode::Resolution;
use crate::error::{ChannelFault, EngineFault};
use crate::rules::{Answer, Decider, GameView, MatchResult, Query};

use super::prompt::Prompt;
use super::resolver::Resolver;
use super::slot::{Shared, Wake};

/// Decision provider of one episode.
pub struct DecisionBridge {
    shared: Arc<Shared>,
    seats: Vec<SeatControl>,
    autopilot: Autopilot,
}

impl DecisionBridge {
    pub(crate) fn new(shared: Arc<Shared>, config: &MatchConfig) -> Self {
        Self {
            shared,
            seats: config.seats.iter().map(|s| s.control).collect(),
            autopilot: Autopilot::new(),
        }
    }

    fn control(&self, player: PlayerId) -> SeatControl {
        self.seats.get(player.index()).copied().unwrap_or_default()
    }

    /// Record the end of the match.
    pub(crate) fn finish(&self, result: Result<MatchResult, EngineFault>, view: Option<GameView>) {
        self.shared.finish(result, view);
    }

    fn answer_in_process(&mut self, view: &GameView, resolver: &Resolver, prompt: &Prompt) -> Answer {
        self.shared.observe(view);
        let selection = self.autopilot.decide(view, prompt);
        resolver
            .translate(&selection)
            .unwrap_or_else(|_| resolver.default_decision().1)
    }

    fn await_polled(&self, view: &GameView, resolver: Resolver, prompt: Prompt) -> Answer {
        let prompt = self.shared.begin(view, prompt, resolver.clone(), true);
        match self.shared.wait() {
            Wake::Delivered(delivered) => {
                self.shared.complete(delivered.selection, Resolution::Actor);
                delivered.answer
            }
            Wake::TimedOut => {
                log::warn!(
                    "[episode {}] prompt {} timed out, applying default",
                    self.shared.episode(),
                    prompt.generation
                );
                let (selection, answer) = resolver.default_decision();
                self.shared.complete(selection, Resolution::Timeout);
                answer
            }
            Wake::Halted => {
                let (selection, answer) = resolver.default_decision();
                self.shared.complete(selection, Resolution::Halted);
                answer
            }
            Wake::Attached => self.consult(view, &resolver, &prompt),
        }
    }

    fn await_responder(&self, view: &GameView, resolver: Resolver, prompt: Prompt) -> Answer {
        let prompt = self.shared.begin(view, prompt, resolver.clone(), false);
        self.consult(view, &resolver, &prompt)
    }

    /// Resolve a published prompt through the attached responder, falling
    /// back to the fallback policy and then to the default decision.
    fn consult(&self, view: &GameView, resolver: &Resolver, prompt: &Prompt) -> Answer {
        let attachments = self.shared.attachments();
        let reply = match attachments.respond(view, prompt) {
            Some(Ok(selection)) => resolver
                .translate(&selection)
                .map(|answer| (selection, answer))
                .map_err(|e| ChannelFault::BadResponse(e.to_string())),
            Some(Err(fault)) => Err(fault),
            None => Err(ChannelFault::Unreachable("responder detached".into())),
        };

        match reply {
            Ok((selection, answer)) => {
                self.shared.complete(selection, Resolution::Responder);
                answer
            }
            Err(fault) => {
                log::warn!(
                    "[episode {}] prompt {}: {}",
                    self.shared.episode(),
                    prompt.generation,
                    fault
                );
                let fallback = attachments
                    .fallback(view, prompt)
                    .and_then(|selection| resolver.translate(&selection).ok().map(|a| (selection, a)));
                match fallback {
                    Some((selection, answer)) => {
                        self.shared.complete(selection, Resolution::Fallback);
                        answer
                    }
                    None => {
                        let (selection, answer) = resolver.default_decision();
                        self.shared.complete(selection, Resolution::Defaulted);
                        answer
                    }
                }
            }
        }
    }
}

impl Decider for DecisionBridge {
    fn decide(&mut self, view: &GameView, query: &Query) -> Answer {
        let (resolver, prompt) = Resolver::prepare(query, view, 0);

        if resolver.is_forced() {
            return resolver.default_decision().1;
        }
        if self.control(query.player()) == SeatControl::Autopilot {
            return self.answer_in_process(view, &resolver, &prompt);
        }
        if self.shared.is_halted() {
            return resolver.default_decision().1;
        }
        if self.shared.attachments().is_attached() {
            return self.await_responder(view, resolver, prompt);
        }
        self.await_polled(view, resolver, prompt)
    }

    fn halted(&self) -> bool {
        self.shared.is_halted()
    }
}
