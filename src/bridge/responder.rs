//! Push-style decision channels.
//!
//! Instead of waiting for a polled decision, the bridge can hand each prompt
//! to an attached [`Responder`] on the engine thread and use its reply
//! directly. Only one responder is attached at a time; while it is, polled
//! decisions are rejected.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::channels::Policy;
use crate::error::ChannelFault;
use crate::rules::GameView;

use super::prompt::{Prompt, Selection};

/// Synchronously answers prompts, e.g. by calling a remote service.
pub trait Responder: Send {
    fn respond(&mut self, view: &GameView, prompt: &Prompt) -> Result<Selection, ChannelFault>;
}

impl<F> Responder for F
where
    F: FnMut(&GameView, &Prompt) -> Result<Selection, ChannelFault> + Send,
{
    fn respond(&mut self, view: &GameView, prompt: &Prompt) -> Result<Selection, ChannelFault> {
        self(view, prompt)
    }
}

/// Responder and fallback policy shared by every episode of a controller.
///
/// Attachments outlive resets: a responder attached once keeps answering
/// the prompts of every later episode until it is detached.
#[derive(Default)]
pub struct Attachments {
    responder: Mutex<Option<Box<dyn Responder>>>,
    fallback: Mutex<Option<Box<dyn Policy>>>,
    attached: AtomicBool,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a responder, replacing any previous one.
    pub fn attach(&self, responder: Box<dyn Responder>) {
        *self.responder.lock() = Some(responder);
        self.attached.store(true, Ordering::SeqCst);
    }

    /// Detach the responder. Waits for an in-flight call to return.
    pub fn detach(&self) -> Option<Box<dyn Responder>> {
        self.attached.store(false, Ordering::SeqCst);
        self.responder.lock().take()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Policy consulted when the responder fails.
    pub fn set_fallback(&self, policy: Box<dyn Policy>) {
        *self.fallback.lock() = Some(policy);
    }

    pub fn clear_fallback(&self) {
        *self.fallback.lock() = None;
    }

    /// Ask the responder. `None` when nothing is attached.
    pub(crate) fn respond(
        &self,
        view: &GameView,
        prompt: &Prompt,
    ) -> Option<Result<Selection, ChannelFault>> {
        self.responder
            .lock()
            .as_mut()
            .map(|responder| responder.respond(view, prompt))
    }

    /// Ask the fallback policy. `None` when no fallback is set.
    pub(crate) fn fallback(&self, view: &GameView, prompt: &Prompt) -> Option<Selection> {
        self.fallback
            .lock()
            .as_mut()
            .map(|policy| policy.decide(view, prompt))
    }
}

impl std::fmt::Debug for Attachments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachments")
            .field("attached", &self.is_attached())
            .field("fallback", &self.fallback.lock().is_some())
            .finish()
    }
}
