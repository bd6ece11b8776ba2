//! Gym-style environment bindings.

use std::time::Duration;

use numpy::PyArray1;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::bridge::{Decision, PromptKind};
use crate::core::{BridgeSettings, MatchConfig, PlayerId, SeatConfig};
use crate::episode::{EpisodeController, Transition, Winner};
use crate::error::EnvError;
use crate::games::DuelFactory;
use crate::observe::{action_mask, FlatEncoder, ObservationEncoder};

fn to_py_err(err: EnvError) -> PyErr {
    if err.is_recoverable() {
        PyErr::new::<PyValueError, _>(err.to_string())
    } else {
        PyErr::new::<PyRuntimeError, _>(err.to_string())
    }
}

/// Duel environment with a discrete action space.
///
/// Seat 0 is the agent; seat 1 is played by the built-in autopilot. Every
/// prompt of the agent is answered with one integer: the catalog index for
/// action choices (indices past the catalog pass), the candidate index for
/// target choices, 0 (yes) or 1 (no) for binary choices.
#[pyclass(name = "DuelEnv")]
pub struct PyDuelEnv {
    controller: EpisodeController,
    encoder: FlatEncoder,
    config: MatchConfig,
    deadline: Option<Duration>,
    agent: PlayerId,
}

impl PyDuelEnv {
    fn observation<'py>(&self, py: Python<'py>, transition: &Transition) -> Bound<'py, PyArray1<f32>> {
        let encoded = self.encoder.encode(&transition.snapshot, self.agent);
        PyArray1::from_vec_bound(py, encoded.tensor)
    }

    fn reward(&self, transition: &Transition) -> f32 {
        match transition.snapshot.winner {
            Some(Winner::Player(p)) if p == self.agent => 1.0,
            Some(Winner::Player(_)) => -1.0,
            _ => 0.0,
        }
    }

    fn info(&self, transition: &Transition) -> String {
        let prompt = self.controller.valid_actions().ok();
        serde_json::json!({
            "episode": transition.snapshot.episode,
            "generation": transition.snapshot.generation,
            "turn": transition.snapshot.turn,
            "phase": transition.snapshot.phase.name(),
            "awaiting": transition.snapshot.awaiting,
            "timed_out": transition.timed_out,
            "winner": transition.snapshot.winner,
            "fault": transition.snapshot.fault,
            "prompt": prompt.as_deref(),
        })
        .to_string()
    }
}

#[pymethods]
impl PyDuelEnv {
    /// Create a new environment.
    ///
    /// # Arguments
    /// - agent_deck / opponent_deck: "aggro", "control" or "midrange"
    /// - max_turns: turn limit before truncation (0 = unlimited)
    /// - action_space: width of the discrete action space
    /// - decision_timeout_ms: default unanswered prompts after this long
    /// - step_deadline_ms: bound on how long `reset`/`step` wait
    #[new]
    #[pyo3(signature = (
        agent_deck = "midrange",
        opponent_deck = "midrange",
        max_turns = 50,
        action_space = 32,
        decision_timeout_ms = None,
        step_deadline_ms = None
    ))]
    fn new(
        agent_deck: &str,
        opponent_deck: &str,
        max_turns: u32,
        action_space: usize,
        decision_timeout_ms: Option<u64>,
        step_deadline_ms: Option<u64>,
    ) -> Self {
        let mut settings = BridgeSettings::new();
        if let Some(ms) = decision_timeout_ms {
            settings = settings.with_decision_timeout(Duration::from_millis(ms));
        }
        let config = MatchConfig::new()
            .with_seats(vec![
                SeatConfig::agent("Agent", agent_deck),
                SeatConfig::autopilot("Autopilot", opponent_deck),
            ])
            .with_max_turns(max_turns);

        Self {
            controller: EpisodeController::new(DuelFactory::new(), settings),
            encoder: FlatEncoder::new(2, action_space).with_max_turns(max_turns),
            config,
            deadline: step_deadline_ms.map(Duration::from_millis),
            agent: PlayerId::new(0),
        }
    }

    /// Start a new episode.
    ///
    /// Returns (observation, info_json).
    #[pyo3(signature = (seed = None))]
    fn reset<'py>(
        &mut self,
        py: Python<'py>,
        seed: Option<u64>,
    ) -> PyResult<(Bound<'py, PyArray1<f32>>, String)> {
        self.config.seed = seed.unwrap_or_else(|| self.config.seed.wrapping_add(1));
        let config = self.config.clone();
        let deadline = self.deadline;
        let controller = &self.controller;
        let transition = py
            .allow_threads(|| controller.reset(config, deadline))
            .map_err(to_py_err)?;
        Ok((self.observation(py, &transition), self.info(&transition)))
    }

    /// Answer the pending prompt with one action index.
    ///
    /// If the engine has not reached its next prompt within the step
    /// deadline, the action is not applied and the result is flagged
    /// `timed_out` in the info.
    ///
    /// Returns (observation, reward, terminated, truncated, info_json).
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        action: usize,
    ) -> PyResult<(Bound<'py, PyArray1<f32>>, f32, bool, bool, String)> {
        let deadline = self.deadline;
        let controller = &self.controller;
        let transition = py
            .allow_threads(|| {
                // A previous step may have returned before the engine's next prompt.
                let current = controller.await_prompt(deadline)?;
                if current.is_terminal() || current.snapshot.awaiting == PromptKind::None {
                    return Ok(current);
                }
                controller.step_index(action, deadline)
            })
            .map_err(to_py_err)?;
        let truncated = transition.snapshot.truncated;
        let terminated = transition.is_terminal() && !truncated;
        Ok((
            self.observation(py, &transition),
            self.reward(&transition),
            terminated,
            truncated,
            self.info(&transition),
        ))
    }

    /// Submit a JSON decision payload: {"generation", "index" | "indices" | "boolean"}.
    fn step_json(&mut self, py: Python<'_>, payload: &str) -> PyResult<String> {
        let decision = Decision::from_json(payload.as_bytes())
            .map_err(|e| to_py_err(e.into()))?;
        let deadline = self.deadline;
        let controller = &self.controller;
        let transition = py
            .allow_threads(|| controller.step(decision, deadline))
            .map_err(to_py_err)?;
        Ok(self.info(&transition))
    }

    /// Mask of live action indices for the pending prompt.
    fn action_mask(&self) -> Vec<bool> {
        match self.controller.valid_actions() {
            Ok(prompt) => action_mask(&prompt, self.encoder.action_space_size()),
            Err(_) => vec![false; self.encoder.action_space_size()],
        }
    }

    /// The pending prompt as JSON, or None when nothing is pending.
    fn prompt_json(&self) -> Option<String> {
        self.controller
            .valid_actions()
            .ok()
            .and_then(|prompt| serde_json::to_string(&*prompt).ok())
    }

    /// Whether the agent is being asked a yes/no question.
    fn awaiting_binary(&self) -> bool {
        self.controller
            .valid_actions()
            .is_ok_and(|prompt| prompt.kind == PromptKind::BinaryChoice)
    }

    #[getter]
    fn action_space_size(&self) -> usize {
        self.encoder.action_space_size()
    }

    #[getter]
    fn observation_size(&self) -> usize {
        self.encoder.output_shape()[0]
    }

    #[getter]
    fn is_terminal(&self) -> PyResult<bool> {
        self.controller.is_terminal().map_err(to_py_err)
    }

    /// Tear the environment down. Later calls raise.
    fn close(&self, py: Python<'_>) {
        let controller = &self.controller;
        py.allow_threads(|| controller.close());
    }

    fn __repr__(&self) -> String {
        match self.controller.state() {
            Ok(snapshot) => format!(
                "DuelEnv(turn={}, generation={}, terminal={})",
                snapshot.turn, snapshot.generation, snapshot.terminal
            ),
            Err(_) => "DuelEnv(not started)".to_string(),
        }
    }
}
