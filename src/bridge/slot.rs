//! Single-slot rendezvous between the engine thread and its consumers.
//!
//! All episode state lives in one `Slot` behind a `parking_lot::Mutex`,
//! paired with one `Condvar`. The engine thread publishes a prompt and
//! sleeps on the condvar; a consumer deposits a decision and wakes it;
//! the engine clears the slot and runs on. Every state change notifies all
//! waiters, so waits never poll.
//!
//! Invariants:
//! - at most one prompt is pending
//! - `generation` only grows, by one per published prompt
//! - at most one decision is accepted per generation
//! - `finished` is written once

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::{BridgeSettings, EpisodeId, MatchConfig};
use crate::episode::{Resolution, StateSnapshot, Transcript, TranscriptEntry, Winner};
use crate::error::{EngineFault, ProtocolError};
use crate::rules::{Answer, GameView, MatchResult};

use super::prompt::{Decision, Prompt, PromptKind, Selection};
use super::resolver::Resolver;
use super::responder::Attachments;

struct Pending {
    prompt: Arc<Prompt>,
    resolver: Resolver,
    /// Waiting for a polled decision, as opposed to a responder call.
    polled: bool,
}

pub(crate) struct Delivered {
    pub selection: Selection,
    pub answer: Answer,
}

struct Finished {
    winner: Winner,
    truncated: bool,
    fault: Option<String>,
}

struct Slot {
    generation: u64,
    pending: Option<Pending>,
    delivered: Option<Delivered>,
    view: GameView,
    finished: Option<Finished>,
    /// Fault budget exhausted.
    aborted: bool,
    timeouts: u32,
    consecutive_faults: u32,
    transcript: Transcript,
}

impl Slot {
    fn awaiting(&self) -> Option<&Arc<Prompt>> {
        match (&self.pending, &self.delivered) {
            (Some(pending), None) => Some(&pending.prompt),
            _ => None,
        }
    }

    fn settled_after(&self, generation: u64) -> bool {
        self.finished.is_some() || self.awaiting().is_some_and(|p| p.generation > generation)
    }
}

/// Why an engine-side wait ended.
pub(crate) enum Wake {
    Delivered(Delivered),
    TimedOut,
    Halted,
    /// A responder was attached while the prompt was waiting.
    Attached,
}

/// State shared between an episode's engine thread and its controller.
pub(crate) struct Shared {
    episode: EpisodeId,
    settings: BridgeSettings,
    attachments: Arc<Attachments>,
    slot: Mutex<Slot>,
    signal: Condvar,
    halted: AtomicBool,
}

impl Shared {
    pub fn new(
        episode: EpisodeId,
        settings: BridgeSettings,
        attachments: Arc<Attachments>,
        config: MatchConfig,
        view: GameView,
    ) -> Self {
        Self {
            episode,
            settings,
            attachments,
            slot: Mutex::new(Slot {
                generation: 0,
                pending: None,
                delivered: None,
                view,
                finished: None,
                aborted: false,
                timeouts: 0,
                consecutive_faults: 0,
                transcript: Transcript::new(config),
            }),
            signal: Condvar::new(),
            halted: AtomicBool::new(false),
        }
    }

    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    // === Consumer side ===

    /// Accept a polled decision for the pending prompt.
    ///
    /// Check and set happen under one lock, so of several concurrent
    /// submissions for the same generation exactly one is accepted.
    pub fn submit(&self, decision: &Decision) -> Result<u64, ProtocolError> {
        let mut slot = self.slot.lock();
        if slot.finished.is_some() || self.is_halted() {
            return Err(ProtocolError::Terminal);
        }
        if self.attachments.is_attached() {
            return Err(ProtocolError::ResponderAttached);
        }

        let current = slot.generation;
        let stale = ProtocolError::Stale {
            submitted: decision.generation,
            current,
        };
        let answer = match &slot.pending {
            Some(pending) if pending.polled && slot.delivered.is_none() => {
                if decision.generation > pending.prompt.generation {
                    return Err(ProtocolError::Premature {
                        submitted: decision.generation,
                        current,
                    });
                }
                if decision.generation < pending.prompt.generation {
                    return Err(stale);
                }
                pending.resolver.translate(&decision.selection)?
            }
            // Already answered, engine not yet at its next prompt.
            _ if current > 0 && decision.generation <= current => return Err(stale),
            _ => return Err(ProtocolError::NoPendingPrompt),
        };

        slot.delivered = Some(Delivered {
            selection: decision.selection.clone(),
            answer,
        });
        log::debug!("[episode {}] accepted decision for generation {}", self.episode, current);
        self.signal.notify_all();
        Ok(current)
    }

    /// Block until a prompt later than `generation` awaits a decision or the
    /// episode finished. Returns false if `deadline` expired first.
    pub fn wait_settled(&self, generation: u64, deadline: Option<Duration>) -> bool {
        self.wait_for(deadline, |slot| slot.settled_after(generation))
    }

    /// Block until some prompt awaits a decision or the episode finished.
    /// Returns false if `deadline` expired first.
    pub fn wait_pending(&self, deadline: Option<Duration>) -> bool {
        self.wait_for(deadline, |slot| slot.finished.is_some() || slot.awaiting().is_some())
    }

    /// Block until the episode finished. Returns false if `deadline` expired
    /// first.
    pub fn wait_finished(&self, deadline: Option<Duration>) -> bool {
        self.wait_for(deadline, |slot| slot.finished.is_some())
    }

    fn wait_for(&self, deadline: Option<Duration>, done: impl Fn(&Slot) -> bool) -> bool {
        let until = deadline.map(|d| Instant::now() + d);
        let mut slot = self.slot.lock();
        loop {
            if done(&*slot) {
                return true;
            }
            match until {
                Some(t) => {
                    if self.signal.wait_until(&mut slot, t).timed_out() {
                        return done(&*slot);
                    }
                }
                None => self.signal.wait(&mut slot),
            }
        }
    }

    /// Release the engine thread: pending and future prompts resolve to
    /// their defaults and the engine is asked to stop.
    pub fn halt(&self) {
        let _slot = self.slot.lock();
        self.halted.store(true, Ordering::SeqCst);
        self.signal.notify_all();
    }

    /// Wake every waiter so it re-checks attachments.
    pub fn poke(&self) {
        let _slot = self.slot.lock();
        self.signal.notify_all();
    }

    /// The prompt awaiting a decision, if any.
    pub fn prompt(&self) -> Option<Arc<Prompt>> {
        self.slot.lock().awaiting().cloned()
    }

    pub fn generation(&self) -> u64 {
        self.slot.lock().generation
    }

    pub fn timeouts(&self) -> u32 {
        self.slot.lock().timeouts
    }

    pub fn is_finished(&self) -> bool {
        self.slot.lock().finished.is_some()
    }

    pub fn winner(&self) -> Option<Winner> {
        self.slot.lock().finished.as_ref().map(|f| f.winner)
    }

    pub fn transcript(&self) -> Transcript {
        self.slot.lock().transcript.clone()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let slot = self.slot.lock();
        let awaiting = slot.awaiting();
        StateSnapshot {
            episode: self.episode,
            generation: slot.generation,
            turn: slot.view.turn,
            phase: slot.view.phase,
            active: slot.view.active,
            priority: slot.view.priority,
            terminal: slot.finished.is_some(),
            truncated: slot.finished.as_ref().is_some_and(|f| f.truncated),
            winner: slot.finished.as_ref().map(|f| f.winner),
            awaiting: awaiting.map_or(PromptKind::None, |p| p.kind),
            awaiting_player: awaiting.and_then(|p| p.player),
            timeouts: slot.timeouts,
            fault: slot.finished.as_ref().and_then(|f| f.fault.clone()),
            view: slot.view.clone(),
        }
    }

    // === Engine side ===

    /// Record the latest view without publishing anything.
    pub fn observe(&self, view: &GameView) {
        self.slot.lock().view = view.clone();
    }

    /// Publish a prompt under the next generation.
    pub fn begin(&self, view: &GameView, mut prompt: Prompt, resolver: Resolver, polled: bool) -> Arc<Prompt> {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        prompt.generation = slot.generation;
        let prompt = Arc::new(prompt);
        slot.view = view.clone();
        slot.delivered = None;
        slot.pending = Some(Pending {
            prompt: Arc::clone(&prompt),
            resolver,
            polled,
        });
        log::debug!(
            "[episode {}] prompt {} {:?} for {:?}",
            self.episode,
            prompt.generation,
            prompt.kind,
            prompt.player
        );
        self.signal.notify_all();
        prompt
    }

    /// Wait for a polled decision on the pending prompt.
    pub fn wait(&self) -> Wake {
        let until = self.settings.decision_timeout.map(|t| Instant::now() + t);
        let mut slot = self.slot.lock();
        loop {
            if let Some(delivered) = slot.delivered.take() {
                return Wake::Delivered(delivered);
            }
            if self.is_halted() {
                return Wake::Halted;
            }
            if self.attachments.is_attached() {
                if let Some(pending) = slot.pending.as_mut() {
                    pending.polled = false;
                }
                return Wake::Attached;
            }
            match until {
                Some(t) => {
                    if self.signal.wait_until(&mut slot, t).timed_out() {
                        return match slot.delivered.take() {
                            Some(delivered) => Wake::Delivered(delivered),
                            None => Wake::TimedOut,
                        };
                    }
                }
                None => self.signal.wait(&mut slot),
            }
        }
    }

    /// Clear the pending prompt and record how it was resolved.
    pub fn complete(&self, selection: Selection, resolution: Resolution) {
        let mut slot = self.slot.lock();
        slot.delivered = None;
        if let Some(pending) = slot.pending.take() {
            slot.transcript.record(TranscriptEntry {
                generation: pending.prompt.generation,
                kind: pending.prompt.kind,
                player: pending.prompt.player,
                selection,
                resolution,
            });
        }

        if resolution == Resolution::Timeout {
            slot.timeouts += 1;
        }
        if resolution.is_fault() {
            slot.consecutive_faults += 1;
            let budget = self.settings.max_consecutive_faults;
            if budget > 0 && slot.consecutive_faults >= budget && !slot.aborted {
                log::warn!(
                    "[episode {}] {} consecutive decision faults, aborting",
                    self.episode,
                    slot.consecutive_faults
                );
                slot.aborted = true;
                self.halted.store(true, Ordering::SeqCst);
            }
        } else if resolution != Resolution::Halted {
            slot.consecutive_faults = 0;
        }
        self.signal.notify_all();
    }

    /// Record the end of the match. Later calls are ignored. Without a
    /// final view the last observed one is kept.
    pub fn finish(&self, result: Result<MatchResult, EngineFault>, view: Option<GameView>) {
        let mut slot = self.slot.lock();
        if slot.finished.is_some() {
            return;
        }

        let finished = match result {
            _ if slot.aborted => Finished {
                winner: Winner::Aborted,
                truncated: false,
                fault: Some(format!(
                    "{} consecutive decision faults",
                    slot.consecutive_faults
                )),
            },
            Ok(MatchResult::Winner(player)) => Finished {
                winner: Winner::Player(player),
                truncated: false,
                fault: None,
            },
            Ok(MatchResult::Draw) => Finished {
                winner: Winner::Nobody,
                truncated: false,
                fault: None,
            },
            Ok(MatchResult::Truncated) => Finished {
                winner: Winner::Nobody,
                truncated: true,
                fault: None,
            },
            Ok(MatchResult::Aborted) => Finished {
                winner: Winner::Aborted,
                truncated: false,
                fault: None,
            },
            Err(fault) => {
                log::error!("[episode {}] {}", self.episode, fault);
                Finished {
                    winner: Winner::Aborted,
                    truncated: false,
                    fault: Some(fault.to_string()),
                }
            }
        };

        log::info!(
            "[episode {}] finished after {} prompts: {:?}",
            self.episode,
            slot.generation,
            finished.winner
        );
        if let Some(view) = view {
            slot.view = view;
        }
        slot.pending = None;
        slot.delivered = None;
        slot.finished = Some(finished);
        self.signal.notify_all();
    }
}
