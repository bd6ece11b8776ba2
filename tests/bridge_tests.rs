//! Decision bridge integration tests.
//!
//! These run scripted engines behind a real `EpisodeController` and check
//! the prompt/decision protocol: generations, validation, defaults,
//! timeouts, teardown and responder routing.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::time::Duration;

use ccg_gym::bridge::{Decision, Prompt, PromptKind, Selection};
use ccg_gym::channels::{Autopilot, Passive, PolicyResponder};
use ccg_gym::core::{BridgeSettings, MatchConfig, PlayerId};
use ccg_gym::episode::{EpisodeController, Resolution, Transcript, Winner};
use ccg_gym::error::{ChannelFault, EnvError, LifecycleError, ProtocolError};
use ccg_gym::rules::{Answer, GameView};

use common::{all_agents, confirm, priority, priority_for, scripted, select, Step};

const WAIT: Option<Duration> = Some(Duration::from_secs(10));

fn controller(steps: Vec<Step>) -> (EpisodeController, common::Log) {
    controller_with(steps, BridgeSettings::new())
}

fn controller_with(steps: Vec<Step>, settings: BridgeSettings) -> (EpisodeController, common::Log) {
    let (factory, log) = scripted(steps);
    (EpisodeController::new(factory, settings), log)
}

fn protocol(result: Result<impl std::fmt::Debug, EnvError>) -> ProtocolError {
    match result {
        Err(EnvError::Protocol(err)) => err,
        other => panic!("expected a protocol error, got {:?}", other),
    }
}

// =============================================================================
// Generations
// =============================================================================

/// Test that each published prompt takes the next generation.
#[test]
fn test_generations_increase_by_one() {
    let (env, log) = controller(vec![
        priority(2),
        select(3, 1, 2),
        confirm(true),
        priority(0),
    ]);

    let t = env.reset(all_agents(), WAIT).unwrap();
    assert_eq!(t.snapshot.generation, 1);
    assert_eq!(t.snapshot.awaiting, PromptKind::ActionChoice);
    assert!(!t.timed_out);

    let t = env.step(Decision::index(1, 0), WAIT).unwrap();
    assert_eq!(t.snapshot.generation, 2);
    assert_eq!(t.snapshot.awaiting, PromptKind::TargetChoice);

    let t = env.step(Decision::indices(2, vec![0, 2]), WAIT).unwrap();
    assert_eq!(t.snapshot.generation, 3);
    assert_eq!(t.snapshot.awaiting, PromptKind::BinaryChoice);

    let t = env.step(Decision::boolean(3, false), WAIT).unwrap();
    assert_eq!(t.snapshot.generation, 4);

    let t = env.step(Decision::index(4, 0), WAIT).unwrap();
    assert!(t.is_terminal());
    assert_eq!(t.snapshot.winner, Some(Winner::Player(PlayerId::new(0))));
    assert_eq!(t.snapshot.generation, 4);

    assert_eq!(
        log.answers(),
        vec![
            Answer::Play(0),
            Answer::Selection(vec![0, 2]),
            Answer::Binary(false),
            Answer::Pass,
        ]
    );
}

/// Test that a prompt with no possible selection is answered without
/// being published.
#[test]
fn test_forced_select_is_not_published() {
    let (env, log) = controller(vec![select(3, 0, 0), priority(1)]);

    let t = env.reset(all_agents(), WAIT).unwrap();
    assert_eq!(t.snapshot.generation, 1);
    assert_eq!(t.snapshot.awaiting, PromptKind::ActionChoice);
    assert_eq!(log.answers(), vec![Answer::Selection(vec![])]);
}

/// Test that autopilot seats are answered in-process.
#[test]
fn test_autopilot_seat_is_not_published() {
    let (env, log) = controller(vec![priority_for(PlayerId::new(1), 2), priority(1)]);

    let t = env.reset(MatchConfig::new(), WAIT).unwrap();
    assert_eq!(t.snapshot.generation, 1);
    assert_eq!(t.snapshot.awaiting_player, Some(PlayerId::new(0)));
    assert_eq!(log.answers(), vec![Answer::Play(0)]);
    assert!(env.transcript().unwrap().is_empty());
}

// =============================================================================
// Validation
// =============================================================================

/// Test that a stale decision is rejected and changes nothing.
#[test]
fn test_stale_decision_leaves_state_unchanged() {
    let (env, log) = controller(vec![priority(1), priority(1)]);
    env.reset(all_agents(), WAIT).unwrap();

    let before = env.state().unwrap();
    assert_eq!(
        protocol(env.step(Decision::index(0, 0), WAIT)),
        ProtocolError::Stale { submitted: 0, current: 1 }
    );
    assert_eq!(env.state().unwrap(), before);

    env.step(Decision::index(1, 0), WAIT).unwrap();
    assert_eq!(
        protocol(env.step(Decision::index(1, 0), WAIT)),
        ProtocolError::Stale { submitted: 1, current: 2 }
    );
    assert_eq!(log.answers().len(), 1);
}

/// Test that a decision for a generation not yet issued is told apart from
/// a stale one and changes nothing.
#[test]
fn test_future_decision_is_premature() {
    let (env, log) = controller(vec![priority(1), priority(1)]);
    env.reset(all_agents(), WAIT).unwrap();

    let before = env.state().unwrap();
    assert_eq!(
        protocol(env.step(Decision::index(3, 0), WAIT)),
        ProtocolError::Premature { submitted: 3, current: 1 }
    );
    assert_eq!(env.state().unwrap(), before);
    assert!(log.answers().is_empty());

    let t = env.step(Decision::index(1, 0), WAIT).unwrap();
    assert_eq!(t.snapshot.generation, 2);
}

/// Test that illegal selections are rejected and the prompt stays pending.
#[test]
fn test_illegal_selections_are_rejected() {
    let (env, log) = controller(vec![select(3, 1, 2), priority(1)]);
    env.reset(all_agents(), WAIT).unwrap();

    assert_eq!(
        protocol(env.step(Decision::indices(1, vec![5]), WAIT)),
        ProtocolError::OutOfRange { index: 5, options: 3 }
    );
    assert_eq!(
        protocol(env.step(Decision::indices(1, vec![0, 0]), WAIT)),
        ProtocolError::DuplicateSelection(0)
    );
    assert_eq!(
        protocol(env.step(Decision::indices(1, vec![]), WAIT)),
        ProtocolError::SelectionCount { count: 0, min: 1, max: 2 }
    );
    assert!(matches!(
        protocol(env.step(Decision::boolean(1, true), WAIT)),
        ProtocolError::WrongSelection { prompt: PromptKind::TargetChoice, .. }
    ));

    let prompt = env.valid_actions().unwrap();
    assert_eq!(prompt.generation, 1);
    assert!(log.answers().is_empty());

    env.step(Decision::indices(1, vec![1]), WAIT).unwrap();
    assert_eq!(log.answers(), vec![Answer::Selection(vec![1])]);
}

/// Test that action indices past the catalog resolve to pass.
#[test]
fn test_overflow_index_passes() {
    let (env, log) = controller(vec![priority(2), priority(2), priority(2)]);
    env.reset(all_agents(), WAIT).unwrap();

    env.step(Decision::index(1, 2), WAIT).unwrap();
    env.step(Decision::index(2, 99), WAIT).unwrap();
    env.step_index(usize::MAX, WAIT).unwrap();

    assert_eq!(log.answers(), vec![Answer::Pass, Answer::Pass, Answer::Pass]);
}

/// Test that JSON payloads are parsed and malformed ones rejected.
#[test]
fn test_json_decisions() {
    let (env, log) = controller(vec![priority(2), confirm(true)]);
    env.reset(all_agents(), WAIT).unwrap();

    assert!(matches!(
        protocol(env.step_json(b"{not json", WAIT)),
        ProtocolError::Malformed(_)
    ));
    assert!(matches!(
        protocol(env.step_json(br#"{"generation": 1, "index": 0, "boolean": true}"#, WAIT)),
        ProtocolError::Malformed(_)
    ));

    env.step_json(br#"{"generation": 1, "index": 1}"#, WAIT).unwrap();
    env.step_json(br#"{"generation": 2, "boolean": false}"#, WAIT).unwrap();
    assert_eq!(log.answers(), vec![Answer::Play(1), Answer::Binary(false)]);
}

/// Test that the pending prompt serializes identically on every read.
#[test]
fn test_prompt_is_stable_across_reads() {
    let (env, _log) = controller(vec![priority(4)]);
    env.reset(all_agents(), WAIT).unwrap();

    let first = serde_json::to_string(&*env.valid_actions().unwrap()).unwrap();
    let second = serde_json::to_string(&*env.valid_actions().unwrap()).unwrap();
    assert_eq!(first, second);

    let prompt: Prompt = serde_json::from_str(&first).unwrap();
    assert_eq!(prompt.options.len(), 5);
    assert_eq!(prompt.pass_index(), Some(4));
}

// =============================================================================
// Concurrency
// =============================================================================

/// Test that concurrent decisions for one prompt apply exactly once.
#[test]
fn test_concurrent_decisions_apply_once() {
    let (env, log) = controller(vec![priority(3), priority(1)]);
    let env = Arc::new(env);
    env.reset(all_agents(), WAIT).unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let accepted = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let env = Arc::clone(&env);
            let barrier = Arc::clone(&barrier);
            let accepted = Arc::clone(&accepted);
            std::thread::spawn(move || {
                barrier.wait();
                match env.step(Decision::index(1, i % 4), WAIT) {
                    Ok(_) => {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(EnvError::Protocol(ProtocolError::Stale { submitted: 1, .. })) => {}
                    Err(other) => panic!("unexpected error: {}", other),
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    assert_eq!(log.answers().len(), 1);
    assert_eq!(env.state().unwrap().generation, 2);
    assert_eq!(env.transcript().unwrap().len(), 1);
}

// =============================================================================
// Timeouts
// =============================================================================

/// Test that unanswered prompts take their defaults after the timeout.
#[test]
fn test_decision_timeout_applies_defaults() {
    let settings = BridgeSettings::new().with_decision_timeout(Duration::from_millis(100));
    let (env, log) = controller_with(vec![priority(2), select(3, 2, 3), confirm(true)], settings);
    env.reset(all_agents(), WAIT).unwrap();

    let t = env.run_to_end(WAIT).unwrap();
    assert!(t.is_terminal());
    assert!(!t.timed_out);
    assert_eq!(t.snapshot.timeouts, 3);
    assert_eq!(
        log.answers(),
        vec![
            Answer::Pass,
            Answer::Selection(vec![0, 1]),
            Answer::Binary(true),
        ]
    );
    let transcript = env.transcript().unwrap();
    assert!(transcript
        .entries
        .iter()
        .all(|e| e.resolution == Resolution::Timeout));

    // Still usable.
    let t = env.reset(all_agents(), WAIT).unwrap();
    assert_eq!(t.snapshot.generation, 1);
    assert_eq!(t.snapshot.timeouts, 0);
    assert!(!t.is_terminal());
}

/// Test that a step deadline returns a flagged transition and the episode
/// carries on.
#[test]
fn test_step_deadline_flags_transition() {
    let (env, _log) = controller(vec![
        priority(1),
        Step::Sleep(Duration::from_millis(400)),
        priority(1),
    ]);
    env.reset(all_agents(), WAIT).unwrap();

    let t = env
        .step(Decision::index(1, 0), Some(Duration::from_millis(20)))
        .unwrap();
    assert!(t.timed_out);
    assert!(!t.is_terminal());
    assert_eq!(t.snapshot.awaiting, PromptKind::None);

    let mut prompt = None;
    for _ in 0..100 {
        if let Ok(p) = env.valid_actions() {
            prompt = Some(p);
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    let prompt = prompt.expect("engine never reached its second prompt");
    assert_eq!(prompt.generation, 2);

    let t = env.step(prompt.decide(Selection::Index(0)), WAIT).unwrap();
    assert!(t.is_terminal());
}

/// Test that a reset deadline returns before the first prompt.
#[test]
fn test_reset_deadline() {
    let (env, _log) = controller(vec![Step::Sleep(Duration::from_millis(300)), priority(1)]);

    let t = env.reset(all_agents(), Some(Duration::from_millis(20))).unwrap();
    assert!(t.timed_out);
    assert_eq!(t.snapshot.generation, 0);
    assert_eq!(
        env.valid_actions().unwrap_err(),
        EnvError::Protocol(ProtocolError::NoPendingPrompt)
    );
    assert_eq!(
        protocol(env.step(Decision::index(1, 0), WAIT)),
        ProtocolError::NoPendingPrompt
    );
}

// =============================================================================
// Termination and teardown
// =============================================================================

/// Test that a terminal episode rejects decisions and stays unchanged.
#[test]
fn test_terminal_is_stable() {
    let (env, _log) = controller(vec![priority(1)]);
    env.reset(all_agents(), WAIT).unwrap();
    let t = env.step(Decision::index(1, 0), WAIT).unwrap();
    assert!(t.is_terminal());

    let first = env.state().unwrap();
    assert_eq!(protocol(env.step(Decision::index(1, 0), WAIT)), ProtocolError::Terminal);
    assert_eq!(protocol(env.valid_actions()), ProtocolError::Terminal);
    assert_eq!(protocol(env.step_index(0, WAIT)), ProtocolError::Terminal);
    assert_eq!(env.state().unwrap(), first);
    assert_eq!(env.winner(), Ok(Some(Winner::Player(PlayerId::new(0)))));
}

/// Test that an engine panic ends the episode as aborted.
#[test]
fn test_engine_panic_aborts() {
    let (env, _log) = controller(vec![priority(1), Step::Panic("scripted failure")]);
    env.reset(all_agents(), WAIT).unwrap();

    let t = env.step(Decision::index(1, 0), WAIT).unwrap();
    assert!(t.is_terminal());
    assert_eq!(t.snapshot.winner, Some(Winner::Aborted));
    assert!(t.snapshot.fault.unwrap().contains("scripted failure"));
    assert_eq!(protocol(env.valid_actions()), ProtocolError::Terminal);
}

/// Test that resetting releases an engine blocked on a prompt.
#[test]
fn test_reset_releases_blocked_engine() {
    let (env, log) = controller(vec![priority(1), priority(1)]);
    env.reset(all_agents(), WAIT).unwrap();
    assert_eq!(log.completed(), 0);

    let t = env.reset(all_agents(), WAIT).unwrap();
    assert_eq!(log.completed(), 1);
    assert_eq!(log.answers(), vec![Answer::Pass]);
    assert_eq!(t.snapshot.generation, 1);
    assert!(!t.is_terminal());

    env.close();
    assert_eq!(log.completed(), 2);
    assert_eq!(
        env.state().unwrap_err(),
        EnvError::Lifecycle(LifecycleError::Closed)
    );
    assert_eq!(
        env.reset(all_agents(), WAIT).unwrap_err(),
        EnvError::Lifecycle(LifecycleError::Closed)
    );

    let closed = EnvError::Lifecycle(LifecycleError::Closed);
    assert_eq!(env.is_terminal(), Err(closed.clone()));
    assert_eq!(env.winner(), Err(closed.clone()));
    assert_eq!(env.await_prompt(WAIT).unwrap_err(), closed);
    assert_eq!(env.attach(Box::new(PolicyResponder::new(Passive))), Err(closed.clone()));
    assert_eq!(env.set_fallback(Box::new(Autopilot::new())), Err(closed.clone()));
    assert!(matches!(env.detach(), Err(e) if e == closed));
}

/// Test that calls before the first reset are rejected.
#[test]
fn test_not_started() {
    let (env, _log) = controller(vec![priority(1)]);
    assert_eq!(
        env.state().unwrap_err(),
        EnvError::Lifecycle(LifecycleError::NotStarted)
    );
    assert_eq!(
        env.step(Decision::index(1, 0), WAIT).unwrap_err(),
        EnvError::Lifecycle(LifecycleError::NotStarted)
    );
    let not_started = EnvError::Lifecycle(LifecycleError::NotStarted);
    assert_eq!(env.is_terminal(), Err(not_started.clone()));
    assert_eq!(env.winner(), Err(not_started.clone()));
    assert_eq!(env.attach(Box::new(PolicyResponder::new(Passive))), Err(not_started.clone()));
    assert_eq!(env.set_fallback(Box::new(Autopilot::new())), Err(not_started.clone()));
    assert!(matches!(env.detach(), Err(e) if e == not_started));

    // Nothing was attached: the first prompt is still polled.
    env.reset(all_agents(), WAIT).unwrap();
    let t = env.step(Decision::index(1, 0), WAIT).unwrap();
    assert!(t.is_terminal());
    assert_eq!(env.is_terminal(), Ok(true));
}

// =============================================================================
// Responders
// =============================================================================

/// Test that polled decisions are refused while a responder is attached.
#[test]
fn test_attached_responder_answers_prompts() {
    let (gate, wait) = mpsc::channel::<()>();
    let responder = move |_: &GameView, prompt: &Prompt| -> Result<Selection, ChannelFault> {
        wait.recv()
            .map_err(|_| ChannelFault::Unreachable("gate closed".into()))?;
        Ok(prompt.default_selection())
    };

    let (env, log) = controller(vec![priority(1), confirm(false)]);
    env.reset(all_agents(), WAIT).unwrap();
    env.attach(Box::new(responder)).unwrap();

    assert_eq!(
        protocol(env.step(Decision::index(1, 0), WAIT)),
        ProtocolError::ResponderAttached
    );

    gate.send(()).unwrap();
    gate.send(()).unwrap();
    let t = env.run_to_end(WAIT).unwrap();
    assert!(t.is_terminal());
    assert_eq!(log.answers(), vec![Answer::Pass, Answer::Binary(false)]);
    let resolutions: Vec<_> = env
        .transcript()
        .unwrap()
        .entries
        .iter()
        .map(|e| e.resolution)
        .collect();
    assert_eq!(resolutions, vec![Resolution::Responder, Resolution::Responder]);
}

/// Test that detaching returns the episode to polled decisions.
#[test]
fn test_detach_restores_polling() {
    let (env, log) = controller(vec![priority(2)]);
    env.reset(all_agents(), WAIT).unwrap();
    env.attach(Box::new(PolicyResponder::new(Passive))).unwrap();
    assert!(env.run_to_end(WAIT).unwrap().is_terminal());
    assert!(env.detach().unwrap().is_some());

    let t = env.reset(all_agents(), WAIT).unwrap();
    assert_eq!(t.snapshot.awaiting, PromptKind::ActionChoice);
    env.step(Decision::index(1, 1), WAIT).unwrap();
    assert_eq!(log.answers(), vec![Answer::Pass, Answer::Play(1)]);
}

/// Test that a failing responder is covered by the fallback policy.
#[test]
fn test_fallback_policy_covers_failures() {
    let failing = |_: &GameView, _: &Prompt| -> Result<Selection, ChannelFault> {
        Err(ChannelFault::Unreachable("connection refused".into()))
    };

    let (env, log) = controller(vec![priority(2), confirm(false)]);
    env.reset(all_agents(), WAIT).unwrap();
    env.set_fallback(Box::new(Autopilot::new())).unwrap();
    env.attach(Box::new(failing)).unwrap();

    let t = env.run_to_end(WAIT).unwrap();
    assert_eq!(t.snapshot.winner, Some(Winner::Player(PlayerId::new(0))));
    assert_eq!(log.answers(), vec![Answer::Play(0), Answer::Binary(true)]);
    assert!(env
        .transcript()
        .unwrap()
        .entries
        .iter()
        .all(|e| e.resolution == Resolution::Fallback));
}

/// Test that too many consecutive faults abort the episode.
#[test]
fn test_fault_budget_aborts() {
    let failing = |_: &GameView, _: &Prompt| -> Result<Selection, ChannelFault> {
        Err(ChannelFault::Timeout(Duration::from_millis(5)))
    };

    let settings = BridgeSettings::new().with_max_consecutive_faults(2);
    let (env, log) = controller_with(vec![priority(1); 5], settings);
    env.reset(all_agents(), WAIT).unwrap();
    env.attach(Box::new(failing)).unwrap();

    let t = env.run_to_end(WAIT).unwrap();
    assert_eq!(t.snapshot.winner, Some(Winner::Aborted));
    assert!(t.snapshot.fault.unwrap().contains("2 consecutive"));
    assert_eq!(log.answers(), vec![Answer::Pass, Answer::Pass]);

    let transcript = env.transcript().unwrap();
    assert_eq!(transcript.len(), 2);
    assert!(transcript
        .entries
        .iter()
        .all(|e| e.resolution == Resolution::Defaulted));
}

// =============================================================================
// Transcripts
// =============================================================================

/// Test that replaying a transcript reproduces the answers.
#[test]
fn test_transcript_replay() {
    let script = vec![priority(2), select(3, 1, 2), confirm(true)];

    let (env, log) = controller(script.clone());
    env.reset(all_agents().with_seed(11), WAIT).unwrap();
    env.step(Decision::index(1, 1), WAIT).unwrap();
    env.step(Decision::indices(2, vec![2, 0]), WAIT).unwrap();
    env.step(Decision::boolean(3, false), WAIT).unwrap();
    assert_eq!(env.is_terminal(), Ok(true));

    let bytes = env.transcript().unwrap().to_bytes().unwrap();
    let transcript = Transcript::from_bytes(&bytes).unwrap();
    assert_eq!(transcript.config.seed, 11);

    let (replayed, replay_log) = controller(script);
    let t = transcript.replay(&replayed, WAIT).unwrap();
    assert!(t.is_terminal());
    assert_eq!(replay_log.answers(), log.answers());
    assert_eq!(replayed.winner().unwrap(), env.winner().unwrap());
}
