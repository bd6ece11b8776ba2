//! Remote channel: forward each prompt to an HTTP decision service.
//!
//! The responder POSTs `{ "episode", "view", "prompt" }` as JSON and expects
//! a decision body back: exactly one of `index`, `indices` or `boolean`,
//! optionally with the `generation` it answers. Every transport or decoding
//! failure becomes a [`ChannelFault`], which the bridge resolves with the
//! fallback policy or the default decision.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::bridge::{Prompt, Responder, Selection};
use crate::core::EpisodeId;
use crate::error::ChannelFault;
use crate::rules::GameView;

#[derive(Serialize)]
struct PolicyRequest<'a> {
    episode: Option<EpisodeId>,
    view: &'a GameView,
    prompt: &'a Prompt,
}

#[derive(Deserialize)]
struct PolicyReply {
    #[serde(default)]
    generation: Option<u64>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    indices: Option<Vec<usize>>,
    #[serde(default)]
    boolean: Option<bool>,
}

impl PolicyReply {
    fn into_selection(self, prompt: &Prompt) -> Result<Selection, ChannelFault> {
        if let Some(generation) = self.generation {
            if generation != prompt.generation {
                return Err(ChannelFault::BadResponse(format!(
                    "reply answers generation {}, prompt is {}",
                    generation, prompt.generation
                )));
            }
        }
        match (self.index, self.indices, self.boolean) {
            (Some(index), None, None) => Ok(Selection::Index(index)),
            (None, Some(indices), None) => Ok(Selection::Indices(indices)),
            (None, None, Some(value)) => Ok(Selection::Boolean(value)),
            _ => Err(ChannelFault::BadResponse(
                "expected exactly one of index, indices, boolean".into(),
            )),
        }
    }
}

/// Blocking HTTP client for a remote decision service.
#[derive(Clone, Debug)]
pub struct RemoteResponder {
    client: Client,
    url: String,
    timeout: Duration,
    episode: Option<EpisodeId>,
}

impl RemoteResponder {
    /// Client posting to `url`, giving up on each call after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChannelFault> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelFault::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
            episode: None,
        })
    }

    /// Tag requests with the episode they belong to.
    pub fn with_episode(mut self, episode: EpisodeId) -> Self {
        self.episode = Some(episode);
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify(&self, err: reqwest::Error) -> ChannelFault {
        if err.is_timeout() {
            ChannelFault::Timeout(self.timeout)
        } else if err.is_decode() {
            ChannelFault::BadResponse(err.to_string())
        } else {
            ChannelFault::Unreachable(err.to_string())
        }
    }
}

impl Responder for RemoteResponder {
    fn respond(&mut self, view: &GameView, prompt: &Prompt) -> Result<Selection, ChannelFault> {
        let request = PolicyRequest {
            episode: self.episode,
            view,
            prompt,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelFault::BadResponse(format!("status {}", status)));
        }
        let reply: PolicyReply = response.json().map_err(|e| self.classify(e))?;
        reply.into_selection(prompt)
    }
}
