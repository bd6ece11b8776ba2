//! Episode controller: one match at a time, driven step by step.
//!
//! ## Lifecycle
//!
//! `Fresh` → `reset` → `Live` → (`reset` → `Live`)* → `close` → `Closed`
//!
//! Each `reset` tears down the previous match (halting its bridge so a
//! blocked engine thread is released with default decisions, then joining
//! the thread) and runs a fresh engine on a dedicated thread.
//!
//! ## Concurrency
//!
//! Every method takes `&self`; controllers are shared across threads behind
//! an `Arc`. Concurrent `step` calls for the same prompt are resolved
//! atomically: one is applied, the rest are rejected as stale.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::bridge::slot::Shared;
use crate::bridge::{Attachments, Decision, DecisionBridge, Prompt, Responder};
use crate::channels::Policy;
use crate::core::{BridgeSettings, EpisodeId, MatchConfig};
use crate::error::{EngineFault, EnvError, LifecycleError, ProtocolError};
use crate::rules::EngineFactory;

use super::snapshot::{StateSnapshot, Transition, Winner};
use super::transcript::Transcript;

struct Running {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

enum Lifecycle {
    Fresh,
    Live(Running),
    Closed,
}

/// Owns the running episode of one environment.
pub struct EpisodeController {
    id: EpisodeId,
    factory: Arc<dyn EngineFactory>,
    settings: BridgeSettings,
    attachments: Arc<Attachments>,
    lifecycle: Mutex<Lifecycle>,
}

impl EpisodeController {
    /// Create a standalone controller.
    pub fn new(factory: impl EngineFactory + 'static, settings: BridgeSettings) -> Self {
        Self::with_factory(EpisodeId::new(0), Arc::new(factory), settings)
    }

    /// Create a controller with an explicit id and a shared factory.
    pub fn with_factory(
        id: EpisodeId,
        factory: Arc<dyn EngineFactory>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            id,
            factory,
            settings,
            attachments: Arc::new(Attachments::new()),
            lifecycle: Mutex::new(Lifecycle::Fresh),
        }
    }

    #[must_use]
    pub fn id(&self) -> EpisodeId {
        self.id
    }

    #[must_use]
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Start a new episode, tearing down the current one.
    ///
    /// Returns once the engine issued its first prompt or finished. If
    /// `deadline` expires first the transition is flagged `timed_out` and
    /// the episode keeps running.
    pub fn reset(&self, config: MatchConfig, deadline: Option<Duration>) -> Result<Transition, EnvError> {
        let mut lifecycle = self.lifecycle.lock();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Fresh) {
            Lifecycle::Closed => {
                *lifecycle = Lifecycle::Closed;
                return Err(LifecycleError::Closed.into());
            }
            Lifecycle::Live(running) => self.teardown(running),
            Lifecycle::Fresh => {}
        }

        let running = self.start(config)?;
        let shared = Arc::clone(&running.shared);
        *lifecycle = Lifecycle::Live(running);
        drop(lifecycle);

        let settled = shared.wait_settled(0, deadline);
        Ok(Transition {
            snapshot: shared.snapshot(),
            timed_out: !settled || shared.timeouts() > 0,
        })
    }

    /// Current snapshot.
    pub fn state(&self) -> Result<StateSnapshot, EnvError> {
        Ok(self.shared()?.snapshot())
    }

    /// The prompt awaiting a decision.
    pub fn valid_actions(&self) -> Result<Arc<Prompt>, EnvError> {
        let shared = self.shared()?;
        if shared.is_finished() {
            return Err(ProtocolError::Terminal.into());
        }
        shared
            .prompt()
            .ok_or_else(|| ProtocolError::NoPendingPrompt.into())
    }

    /// Submit a decision and wait until the engine reaches its next prompt
    /// or ends.
    ///
    /// Stale, out-of-range and malformed decisions are rejected without any
    /// state change.
    pub fn step(&self, decision: Decision, deadline: Option<Duration>) -> Result<Transition, EnvError> {
        let shared = self.shared()?;
        let before = shared.timeouts();
        let generation = shared.submit(&decision)?;
        let settled = shared.wait_settled(generation, deadline);
        Ok(Transition {
            snapshot: shared.snapshot(),
            timed_out: !settled || shared.timeouts() > before,
        })
    }

    /// Answer the current prompt with a single index from a fixed-size
    /// action space. See [`Prompt::selection_for_index`].
    pub fn step_index(&self, index: usize, deadline: Option<Duration>) -> Result<Transition, EnvError> {
        let prompt = self.valid_actions()?;
        let decision = prompt.decide(prompt.selection_for_index(index));
        self.step(decision, deadline)
    }

    /// Parse a JSON decision payload and submit it.
    pub fn step_json(&self, payload: &[u8], deadline: Option<Duration>) -> Result<Transition, EnvError> {
        let decision = Decision::from_json(payload)?;
        self.step(decision, deadline)
    }

    /// Wait for the episode to end while an attached responder or autopilot
    /// seats answer every prompt.
    pub fn run_to_end(&self, deadline: Option<Duration>) -> Result<Transition, EnvError> {
        let shared = self.shared()?;
        let finished = shared.wait_finished(deadline);
        Ok(Transition {
            snapshot: shared.snapshot(),
            timed_out: !finished,
        })
    }

    /// Wait until the engine publishes its next prompt or ends.
    ///
    /// Returns at once if a prompt is already pending. Use after a
    /// `timed_out` transition to pick the episode up again.
    pub fn await_prompt(&self, deadline: Option<Duration>) -> Result<Transition, EnvError> {
        let shared = self.shared()?;
        let settled = shared.wait_pending(deadline);
        Ok(Transition {
            snapshot: shared.snapshot(),
            timed_out: !settled,
        })
    }

    pub fn is_terminal(&self) -> Result<bool, EnvError> {
        Ok(self.shared()?.is_finished())
    }

    /// Outcome of the episode, once terminal.
    pub fn winner(&self) -> Result<Option<Winner>, EnvError> {
        Ok(self.shared()?.winner())
    }

    /// Prompts of the current episode resolved so far.
    pub fn transcript(&self) -> Result<Transcript, EnvError> {
        Ok(self.shared()?.transcript())
    }

    /// Route prompts to `responder` instead of waiting for polled
    /// decisions. Applies to the pending prompt and every later episode.
    pub fn attach(&self, responder: Box<dyn Responder>) -> Result<(), EnvError> {
        self.while_live(|shared| {
            self.attachments.attach(responder);
            shared.poke();
        })?;
        log::debug!("[episode {}] responder attached", self.id);
        Ok(())
    }

    /// Return to polled decisions.
    pub fn detach(&self) -> Result<Option<Box<dyn Responder>>, EnvError> {
        self.shared()?;
        let responder = self.attachments.detach();
        log::debug!("[episode {}] responder detached", self.id);
        Ok(responder)
    }

    /// Policy answering prompts when the responder fails.
    pub fn set_fallback(&self, policy: Box<dyn Policy>) -> Result<(), EnvError> {
        self.while_live(|_| self.attachments.set_fallback(policy))?;
        Ok(())
    }

    /// Tear down the episode. The controller rejects every later call.
    pub fn close(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if let Lifecycle::Live(running) = std::mem::replace(&mut *lifecycle, Lifecycle::Closed) {
            self.teardown(running);
        }
    }

    fn shared(&self) -> Result<Arc<Shared>, LifecycleError> {
        match &*self.lifecycle.lock() {
            Lifecycle::Fresh => Err(LifecycleError::NotStarted),
            Lifecycle::Live(running) => Ok(Arc::clone(&running.shared)),
            Lifecycle::Closed => Err(LifecycleError::Closed),
        }
    }

    /// Run `f` under the lifecycle lock, so `close` cannot interleave.
    fn while_live<T>(&self, f: impl FnOnce(&Shared) -> T) -> Result<T, LifecycleError> {
        match &*self.lifecycle.lock() {
            Lifecycle::Fresh => Err(LifecycleError::NotStarted),
            Lifecycle::Live(running) => Ok(f(&running.shared)),
            Lifecycle::Closed => Err(LifecycleError::Closed),
        }
    }

    fn start(&self, config: MatchConfig) -> Result<Running, EnvError> {
        let mut engine = self.factory.create(&config)?;
        let shared = Arc::new(Shared::new(
            self.id,
            self.settings.clone(),
            Arc::clone(&self.attachments),
            config.clone(),
            engine.view(),
        ));
        let mut bridge = DecisionBridge::new(Arc::clone(&shared), &config);

        log::info!("[episode {}] starting match, seed {}", self.id, config.seed);
        let thread = std::thread::Builder::new()
            .name(format!("episode-{}", self.id))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| engine.run(&mut bridge)))
                    .unwrap_or_else(|payload| Err(EngineFault::Panicked(panic_message(payload.as_ref()))));
                let view = panic::catch_unwind(AssertUnwindSafe(|| engine.view())).ok();
                bridge.finish(result, view);
            })
            .map_err(|e| EngineFault::Failed(format!("cannot spawn engine thread: {}", e)))?;

        Ok(Running {
            shared,
            thread: Some(thread),
        })
    }

    fn teardown(&self, mut running: Running) {
        running.shared.halt();
        if running.shared.wait_finished(Some(self.settings.teardown_grace)) {
            if let Some(thread) = running.thread.take() {
                if thread.join().is_err() {
                    log::error!("[episode {}] engine thread panicked during teardown", self.id);
                }
            }
        } else {
            log::warn!(
                "[episode {}] engine did not stop within {:?}, detaching its thread",
                self.id,
                self.settings.teardown_grace
            );
        }
    }
}

impl Drop for EpisodeController {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for EpisodeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpisodeController")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("attachments", &self.attachments)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
