//! In-process decision policies.
//!
//! A [`Policy`] picks a selection for a prompt from the public view. The
//! same trait serves autopilot seats, embedded drivers and the fallback of
//! a failing responder.

use crate::bridge::{Prompt, PromptKind, PromptOption, Selection};
use crate::catalog::ActionKind;
use crate::core::GameRng;
use crate::rules::{GameView, Purpose, Target};

/// Chooses selections for prompts.
pub trait Policy: Send {
    fn decide(&mut self, view: &GameView, prompt: &Prompt) -> Selection;
}

impl<F> Policy for F
where
    F: FnMut(&GameView, &Prompt) -> Selection + Send,
{
    fn decide(&mut self, view: &GameView, prompt: &Prompt) -> Selection {
        self(view, prompt)
    }
}

/// Always applies the default decision: pass, minimum selection, fallback.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passive;

impl Policy for Passive {
    fn decide(&mut self, _view: &GameView, prompt: &Prompt) -> Selection {
        prompt.default_selection()
    }
}

/// Deterministic greedy player used for autopilot seats.
///
/// - plays a land if it can, then casts, then activates, then passes
/// - attacks with everything, never blocks
/// - aims at the opponent's face, then at opposing permanents
/// - keeps opening hands and accepts optional triggers
#[derive(Clone, Copy, Debug, Default)]
pub struct Autopilot;

impl Autopilot {
    pub fn new() -> Self {
        Self
    }

    fn choose_action(prompt: &Prompt) -> Selection {
        let first_of = |kind: ActionKind| {
            prompt.options.iter().find_map(|option| match option {
                PromptOption::Action(entry) if entry.kind == kind => Some(entry.index),
                _ => None,
            })
        };
        let index = first_of(ActionKind::PlayPermanent)
            .or_else(|| first_of(ActionKind::Cast))
            .or_else(|| first_of(ActionKind::Activate))
            .or_else(|| prompt.pass_index())
            .unwrap_or(0);
        Selection::Index(index)
    }

    fn choose_targets(view: &GameView, prompt: &Prompt) -> Selection {
        let me = prompt.player;
        let hostile = |target: &Target| match target {
            Target::Player(p) => Some(*p) != me,
            Target::Object(o) => view.controller_of(*o).is_some_and(|c| Some(c) != me),
        };
        let wanted = prompt.min.max(1).min(prompt.max);
        let mut picked: Vec<usize> = prompt
            .options
            .iter()
            .filter_map(|option| match option {
                PromptOption::Target { index, target, .. } if hostile(target) => Some(*index),
                _ => None,
            })
            .take(wanted)
            .collect();
        let mut next = 0;
        while picked.len() < prompt.min && next < prompt.options.len() {
            if !picked.contains(&next) {
                picked.push(next);
            }
            next += 1;
        }
        Selection::Indices(picked)
    }
}

impl Policy for Autopilot {
    fn decide(&mut self, view: &GameView, prompt: &Prompt) -> Selection {
        match (prompt.kind, prompt.purpose) {
            (PromptKind::ActionChoice, _) => Self::choose_action(prompt),
            (PromptKind::TargetChoice, Some(Purpose::Attackers)) => {
                Selection::Indices((0..prompt.max).collect())
            }
            (PromptKind::TargetChoice, Some(Purpose::Targets { .. })) => {
                Self::choose_targets(view, prompt)
            }
            (PromptKind::BinaryChoice, Some(Purpose::Mulligan))
            | (PromptKind::BinaryChoice, Some(Purpose::OptionalTrigger { .. })) => {
                Selection::Boolean(true)
            }
            _ => prompt.default_selection(),
        }
    }
}

/// Uniformly random legal selections from a seeded stream.
#[derive(Clone, Debug)]
pub struct RandomPolicy {
    rng: GameRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::new(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn decide(&mut self, _view: &GameView, prompt: &Prompt) -> Selection {
        let len = prompt.options.len();
        match prompt.kind {
            PromptKind::ActionChoice if len > 0 => Selection::Index(self.rng.gen_range_usize(0..len)),
            PromptKind::TargetChoice => {
                let count = self.rng.gen_range_usize(prompt.min..prompt.max + 1);
                let mut indices: Vec<usize> = (0..len).collect();
                self.rng.shuffle(&mut indices);
                indices.truncate(count);
                Selection::Indices(indices)
            }
            PromptKind::BinaryChoice => Selection::Boolean(self.rng.gen_bool(0.5)),
            _ => prompt.default_selection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionCatalog;
    use crate::core::{ObjectId, PlayerId};
    use crate::rules::{CardView, PlayChoice, PlayerView};

    fn action_prompt(choices: &[PlayChoice]) -> Prompt {
        Prompt {
            kind: PromptKind::ActionChoice,
            generation: 1,
            player: Some(PlayerId::new(0)),
            purpose: Some(Purpose::Priority),
            options: ActionCatalog::build(choices)
                .entries()
                .iter()
                .cloned()
                .map(PromptOption::Action)
                .collect(),
            min: 1,
            max: 1,
            ..Prompt::default()
        }
    }

    fn target_prompt(purpose: Purpose, targets: &[Target], min: usize, max: usize) -> Prompt {
        Prompt {
            kind: PromptKind::TargetChoice,
            generation: 1,
            player: Some(PlayerId::new(0)),
            purpose: Some(purpose),
            options: targets
                .iter()
                .enumerate()
                .map(|(index, target)| PromptOption::Target {
                    index,
                    target: *target,
                    description: String::new(),
                })
                .collect(),
            min,
            max,
            ..Prompt::default()
        }
    }

    #[test]
    fn test_autopilot_prefers_land_then_cast() {
        let prompt = action_prompt(&[
            PlayChoice::cast(ObjectId(2), "Grizzly Bears", 0),
            PlayChoice::play_land(ObjectId(3), "Forest", 1),
        ]);
        assert_eq!(Autopilot.decide(&GameView::default(), &prompt), Selection::Index(1));

        let prompt = action_prompt(&[PlayChoice::cast(ObjectId(2), "Grizzly Bears", 0)]);
        assert_eq!(Autopilot.decide(&GameView::default(), &prompt), Selection::Index(0));

        let prompt = action_prompt(&[]);
        assert_eq!(Autopilot.decide(&GameView::default(), &prompt), Selection::Index(0));
    }

    #[test]
    fn test_autopilot_targets_opponent() {
        let mut mine = PlayerView::new(PlayerId::new(0), "A", "aggro", 20);
        mine.battlefield.push_back(CardView::new(ObjectId(5), "Bear"));
        let view = GameView {
            players: vec![mine, PlayerView::new(PlayerId::new(1), "B", "aggro", 20)],
            ..GameView::default()
        };
        let prompt = target_prompt(
            Purpose::Targets { source: ObjectId(9) },
            &[
                Target::Player(PlayerId::new(0)),
                Target::Object(ObjectId(5)),
                Target::Player(PlayerId::new(1)),
            ],
            1,
            1,
        );
        assert_eq!(Autopilot.decide(&view, &prompt), Selection::Indices(vec![2]));
    }

    #[test]
    fn test_autopilot_attacks_all_blocks_none() {
        let targets = [Target::Object(ObjectId(1)), Target::Object(ObjectId(2))];
        let attack = target_prompt(Purpose::Attackers, &targets, 0, 2);
        assert_eq!(
            Autopilot.decide(&GameView::default(), &attack),
            Selection::Indices(vec![0, 1])
        );

        let block = target_prompt(Purpose::Blockers { attacker: ObjectId(7) }, &targets, 0, 1);
        assert_eq!(
            Autopilot.decide(&GameView::default(), &block),
            Selection::Indices(vec![])
        );
    }

    #[test]
    fn test_random_policy_stays_in_bounds() {
        let targets: Vec<_> = (0..5).map(|i| Target::Object(ObjectId(i))).collect();
        let prompt = target_prompt(Purpose::Discard, &targets, 2, 3);
        let mut policy = RandomPolicy::new(11);
        for _ in 0..50 {
            match policy.decide(&GameView::default(), &prompt) {
                Selection::Indices(v) => {
                    assert!(v.len() >= 2 && v.len() <= 3);
                    assert!(v.iter().all(|&i| i < 5));
                }
                other => panic!("unexpected selection {:?}", other),
            }
        }
    }

    #[test]
    fn test_closure_policy() {
        let mut always_first = |_: &GameView, _: &Prompt| Selection::Index(0);
        let prompt = action_prompt(&[]);
        assert_eq!(always_first.decide(&GameView::default(), &prompt), Selection::Index(0));
    }
}
