//! Shared fixtures for the integration tests.
//!
//! `ScriptedEngine` walks a fixed list of steps: it asks each query in turn,
//! records the answer it got back, and can sleep or panic on the way. It
//! wins for seat 0 once the script is exhausted.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use ccg_gym::core::{MatchConfig, ObjectId, PlayerId};
use ccg_gym::rules::{
    Answer, Candidate, Decider, Engine, GameView, MatchResult, Phase, PlayChoice, PlayerView,
    Purpose, Query,
};
use ccg_gym::{EngineFactory, EngineFault};

/// One scripted engine action.
#[derive(Clone, Debug)]
pub enum Step {
    Ask(Query),
    Sleep(Duration),
    Panic(&'static str),
}

/// What scripted engines did, shared with the test body.
#[derive(Clone, Default)]
pub struct Log {
    pub answers: Arc<Mutex<Vec<Answer>>>,
    /// Runs that returned without panicking.
    pub completed: Arc<AtomicUsize>,
}

impl Log {
    pub fn answers(&self) -> Vec<Answer> {
        self.answers.lock().clone()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

pub struct ScriptedEngine {
    steps: Vec<Step>,
    log: Log,
    turn: u32,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<Step>, log: Log) -> Self {
        Self { steps, log, turn: 0 }
    }
}

impl Engine for ScriptedEngine {
    fn run(&mut self, decider: &mut dyn Decider) -> Result<MatchResult, EngineFault> {
        let steps = self.steps.clone();
        for step in steps {
            if decider.halted() {
                self.log.completed.fetch_add(1, Ordering::SeqCst);
                return Ok(MatchResult::Aborted);
            }
            self.turn += 1;
            match step {
                Step::Ask(query) => {
                    let answer = decider.decide(&self.view(), &query);
                    self.log.answers.lock().push(answer);
                }
                Step::Sleep(duration) => std::thread::sleep(duration),
                Step::Panic(message) => panic!("{}", message),
            }
        }
        self.log.completed.fetch_add(1, Ordering::SeqCst);
        Ok(MatchResult::Winner(PlayerId::new(0)))
    }

    fn view(&self) -> GameView {
        GameView {
            turn: self.turn,
            phase: Phase::Main1,
            active: PlayerId::new(0),
            priority: Some(PlayerId::new(0)),
            stack: 0,
            players: vec![
                PlayerView::new(PlayerId::new(0), "Alice", "script", 20),
                PlayerView::new(PlayerId::new(1), "Bob", "script", 20),
            ],
        }
    }
}

/// Factory building a fresh scripted engine on every reset.
pub fn scripted(steps: Vec<Step>) -> (impl EngineFactory, Log) {
    let log = Log::default();
    let shared = log.clone();
    let factory = move |_: &MatchConfig| -> Result<Box<dyn Engine>, EngineFault> {
        Ok(Box::new(ScriptedEngine::new(steps.clone(), shared.clone())))
    };
    (factory, log)
}

/// Priority query for seat 0 with `n` castable cards in hand.
pub fn priority(n: usize) -> Step {
    priority_for(PlayerId::new(0), n)
}

pub fn priority_for(player: PlayerId, n: usize) -> Step {
    let choices = (0..n)
        .map(|i| PlayChoice::cast(ObjectId(100 + i as u32), format!("Card {}", i), i))
        .collect();
    Step::Ask(Query::Priority { player, choices })
}

/// Select query for seat 0 over `n` candidate objects.
pub fn select(n: usize, min: usize, max: usize) -> Step {
    let candidates = (0..n)
        .map(|i| Candidate::object(ObjectId(200 + i as u32), format!("Target {}", i)))
        .collect();
    Step::Ask(Query::Select {
        player: PlayerId::new(0),
        purpose: Purpose::Discard,
        text: "Discard".into(),
        candidates,
        min,
        max,
    })
}

/// Confirm query for seat 0.
pub fn confirm(fallback: bool) -> Step {
    Step::Ask(Query::Confirm {
        player: PlayerId::new(0),
        purpose: Purpose::Mulligan,
        text: "Keep this hand?".into(),
        fallback,
    })
}

pub fn all_agents() -> MatchConfig {
    MatchConfig::new().with_seed(7).with_all_agents()
}
