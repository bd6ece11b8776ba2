//! Observation encoding for RL policies.
//!
//! Transforms episode snapshots into flat `f32` tensors.

use serde::{Deserialize, Serialize};

use crate::bridge::{Prompt, PromptKind};
use crate::core::PlayerId;
use crate::episode::StateSnapshot;
use crate::rules::{Phase, PlayerView};

/// Encoded observation as a flat tensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedObservation {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,

    pub shape: Vec<usize>,
}

impl EncodedObservation {
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            tensor: vec![0.0; size],
            shape,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.tensor.get(index).copied()
    }
}

/// Encodes snapshots into tensors for policy input.
///
/// Each encoder defines:
/// - How to convert a snapshot to a tensor from a player's perspective
/// - The shape of the output tensor
/// - The size of the discrete action space it pairs with
pub trait ObservationEncoder: Send + Sync {
    /// Encode the snapshot from a player's perspective.
    ///
    /// Only public information may be encoded: opponent hands contribute
    /// their size, never their contents.
    fn encode(&self, snapshot: &StateSnapshot, perspective: PlayerId) -> EncodedObservation;

    fn output_shape(&self) -> Vec<usize>;

    /// Width of the discrete action space. Indices past the live catalog
    /// collapse to pass.
    fn action_space_size(&self) -> usize;
}

const PROMPT_KINDS: [PromptKind; 4] = [
    PromptKind::ActionChoice,
    PromptKind::TargetChoice,
    PromptKind::BinaryChoice,
    PromptKind::None,
];

/// Flat encoder for two-seat card duels.
///
/// Layout:
/// - global: turn progress, phase one-hot, perspective is active, perspective
///   has priority, awaiting-prompt one-hot, terminal
/// - per player, perspective first: life, hand, library, battlefield,
///   graveyard, tapped share, total power
#[derive(Clone, Debug)]
pub struct FlatEncoder {
    player_count: usize,
    action_space: usize,
    max_turns: f32,
    max_life: f32,
    max_cards: f32,
    max_library: f32,
}

impl Default for FlatEncoder {
    fn default() -> Self {
        Self::new(2, 32)
    }
}

impl FlatEncoder {
    pub fn new(player_count: usize, action_space: usize) -> Self {
        Self {
            player_count,
            action_space,
            max_turns: 50.0,
            max_life: 40.0,
            max_cards: 20.0,
            max_library: 60.0,
        }
    }

    /// Turn count used to normalize turn progress.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1) as f32;
        self
    }

    pub fn with_max_life(mut self, max_life: f32) -> Self {
        self.max_life = max_life;
        self
    }

    fn global_features(&self) -> usize {
        1 + Phase::ALL.len() + 2 + PROMPT_KINDS.len() + 1
    }

    fn features_per_player() -> usize {
        7
    }

    fn encode_player(&self, player: &PlayerView, out: &mut Vec<f32>) {
        let creatures: Vec<_> = player.battlefield.iter().filter(|c| c.stats.is_some()).collect();
        let tapped = player.battlefield.iter().filter(|c| c.tapped).count();
        let power: i32 = creatures.iter().filter_map(|c| c.stats).map(|(p, _)| p.max(0)).sum();

        out.push(norm(player.life as f32, self.max_life));
        out.push(norm(player.hand.len() as f32, self.max_cards));
        out.push(norm(player.library as f32, self.max_library));
        out.push(norm(player.battlefield.len() as f32, self.max_cards));
        out.push(norm(player.graveyard.len() as f32, self.max_library));
        out.push(if player.battlefield.is_empty() {
            0.0
        } else {
            tapped as f32 / player.battlefield.len() as f32
        });
        out.push(norm(power as f32, self.max_cards));
    }
}

fn norm(value: f32, max: f32) -> f32 {
    (value / max).clamp(0.0, 1.0)
}

fn flag(on: bool) -> f32 {
    if on {
        1.0
    } else {
        0.0
    }
}

impl ObservationEncoder for FlatEncoder {
    fn encode(&self, snapshot: &StateSnapshot, perspective: PlayerId) -> EncodedObservation {
        let mut tensor = Vec::with_capacity(self.output_shape()[0]);

        tensor.push(norm(snapshot.turn as f32, self.max_turns));
        tensor.extend(Phase::ALL.iter().map(|&p| flag(p == snapshot.phase)));
        tensor.push(flag(snapshot.active == perspective));
        tensor.push(flag(snapshot.priority == Some(perspective)));
        tensor.extend(PROMPT_KINDS.iter().map(|&k| flag(k == snapshot.awaiting)));
        tensor.push(flag(snapshot.terminal));

        // Perspective first, then the others in seat order after it.
        for offset in 0..self.player_count {
            let seat = PlayerId::new(((perspective.index() + offset) % self.player_count) as u8);
            match snapshot.view.player(seat) {
                Some(player) => self.encode_player(player, &mut tensor),
                None => tensor.extend(std::iter::repeat(0.0).take(Self::features_per_player())),
            }
        }

        EncodedObservation::new(tensor, self.output_shape())
    }

    fn output_shape(&self) -> Vec<usize> {
        vec![self.global_features() + Self::features_per_player() * self.player_count]
    }

    fn action_space_size(&self) -> usize {
        self.action_space
    }
}

/// Legal-index mask of a prompt over a fixed action space.
///
/// Overflowing action indices are legal too (they collapse to pass) but are
/// masked out so policies learn one index per catalog entry.
#[must_use]
pub fn action_mask(prompt: &Prompt, action_space: usize) -> Vec<bool> {
    let live = match prompt.kind {
        PromptKind::None => 0,
        _ => prompt.options.len(),
    };
    (0..action_space).map(|i| i < live).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EpisodeId, ObjectId};
    use crate::rules::{CardView, GameView};

    fn snapshot() -> StateSnapshot {
        let mut me = PlayerView::new(PlayerId::new(0), "A", "aggro", 20);
        me.library = 30;
        let mut bear = CardView::new(ObjectId(1), "Bear");
        bear.stats = Some((2, 2));
        bear.tapped = true;
        me.battlefield.push_back(bear);
        let them = PlayerView::new(PlayerId::new(1), "B", "control", 10);
        StateSnapshot {
            episode: EpisodeId::new(1),
            generation: 3,
            turn: 5,
            phase: Phase::Main1,
            active: PlayerId::new(0),
            priority: Some(PlayerId::new(0)),
            terminal: false,
            truncated: false,
            winner: None,
            awaiting: PromptKind::ActionChoice,
            awaiting_player: Some(PlayerId::new(0)),
            timeouts: 0,
            fault: None,
            view: GameView {
                turn: 5,
                phase: Phase::Main1,
                players: vec![me, them],
                ..GameView::default()
            },
        }
    }

    #[test]
    fn test_shape_matches_output() {
        let encoder = FlatEncoder::default();
        let encoded = encoder.encode(&snapshot(), PlayerId::new(0));
        assert_eq!(encoded.shape, encoder.output_shape());
        assert_eq!(encoded.len(), encoder.output_shape()[0]);
        assert!(encoded.tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_perspective_rotates_players() {
        let encoder = FlatEncoder::default();
        let global = encoder.global_features();
        let mine = encoder.encode(&snapshot(), PlayerId::new(0));
        let theirs = encoder.encode(&snapshot(), PlayerId::new(1));

        assert_eq!(mine.get(global), Some(0.5));
        assert_eq!(theirs.get(global), Some(0.25));
        assert_eq!(theirs.get(global + FlatEncoder::features_per_player()), Some(0.5));
        // active flag
        let active = 1 + Phase::ALL.len();
        assert_eq!(mine.get(active), Some(1.0));
        assert_eq!(theirs.get(active), Some(0.0));
    }

    #[test]
    fn test_action_mask() {
        let prompt = Prompt {
            kind: PromptKind::TargetChoice,
            options: vec![
                crate::bridge::PromptOption::Target {
                    index: 0,
                    target: crate::rules::Target::Player(PlayerId::new(1)),
                    description: String::new(),
                },
            ],
            ..Prompt::default()
        };
        assert_eq!(action_mask(&prompt, 3), vec![true, false, false]);
        assert_eq!(action_mask(&Prompt::default(), 2), vec![false, false]);
    }
}
