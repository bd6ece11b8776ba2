//! Public game state as engines report it.
//!
//! Zones are `im::Vector`s so views clone in O(1); the bridge keeps the most
//! recent view for every snapshot it hands out.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{ObjectId, PlayerId};

/// Turn step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before the first turn: mulligans.
    #[default]
    Setup,
    Untap,
    Upkeep,
    Draw,
    Main1,
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    FirstStrikeDamage,
    CombatDamage,
    EndCombat,
    Main2,
    End,
    Cleanup,
}

impl Phase {
    pub const ALL: [Phase; 14] = [
        Phase::Setup,
        Phase::Untap,
        Phase::Upkeep,
        Phase::Draw,
        Phase::Main1,
        Phase::BeginCombat,
        Phase::DeclareAttackers,
        Phase::DeclareBlockers,
        Phase::FirstStrikeDamage,
        Phase::CombatDamage,
        Phase::EndCombat,
        Phase::Main2,
        Phase::End,
        Phase::Cleanup,
    ];

    /// Position in [`Phase::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::Setup => "Setup",
            Phase::Untap => "Untap",
            Phase::Upkeep => "Upkeep",
            Phase::Draw => "Draw",
            Phase::Main1 => "Main Phase 1",
            Phase::BeginCombat => "Beginning of Combat",
            Phase::DeclareAttackers => "Declare Attackers",
            Phase::DeclareBlockers => "Declare Blockers",
            Phase::FirstStrikeDamage => "First Strike Damage",
            Phase::CombatDamage => "Combat Damage",
            Phase::EndCombat => "End of Combat",
            Phase::Main2 => "Main Phase 2",
            Phase::End => "End of Turn",
            Phase::Cleanup => "Cleanup",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A card in some zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub tapped: bool,
    /// Power and toughness for creatures.
    #[serde(default)]
    pub stats: Option<(i32, i32)>,
}

impl CardView {
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tapped: false,
            stats: None,
        }
    }
}

/// One seat's public state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub life: i32,
    pub deck: String,
    /// Cards left in the library.
    pub library: usize,
    pub hand: Vector<CardView>,
    pub graveyard: Vector<CardView>,
    pub exile: Vector<CardView>,
    pub battlefield: Vector<CardView>,
}

impl PlayerView {
    pub fn new(id: PlayerId, name: impl Into<String>, deck: impl Into<String>, life: i32) -> Self {
        Self {
            id,
            name: name.into(),
            life,
            deck: deck.into(),
            library: 0,
            hand: Vector::new(),
            graveyard: Vector::new(),
            exile: Vector::new(),
            battlefield: Vector::new(),
        }
    }
}

/// Public state of a match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    /// Turn counter, 0 before the first turn.
    pub turn: u32,
    pub phase: Phase,
    pub active: PlayerId,
    /// Player holding priority, if anyone.
    pub priority: Option<PlayerId>,
    /// Objects waiting to resolve.
    pub stack: usize,
    pub players: Vec<PlayerView>,
}

impl GameView {
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&PlayerView> {
        self.players.get(id.index())
    }

    /// Seat controlling a permanent on the battlefield.
    #[must_use]
    pub fn controller_of(&self, object: ObjectId) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.battlefield.iter().any(|c| c.id == object))
            .map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Main1.name(), "Main Phase 1");
        assert_eq!(Phase::End.to_string(), "End of Turn");
        assert_eq!(Phase::ALL.len(), 14);
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn test_controller_of() {
        let mut p0 = PlayerView::new(PlayerId::new(0), "A", "aggro", 20);
        let mut p1 = PlayerView::new(PlayerId::new(1), "B", "aggro", 20);
        p0.battlefield.push_back(CardView::new(ObjectId(1), "Forest"));
        p1.battlefield.push_back(CardView::new(ObjectId(2), "Grizzly Bears"));

        let view = GameView {
            players: vec![p0, p1],
            ..GameView::default()
        };
        assert_eq!(view.controller_of(ObjectId(2)), Some(PlayerId::new(1)));
        assert_eq!(view.controller_of(ObjectId(3)), None);
    }

    #[test]
    fn test_view_clone_shares_zones() {
        let mut player = PlayerView::new(PlayerId::new(0), "A", "aggro", 20);
        for i in 0..50 {
            player.hand.push_back(CardView::new(ObjectId(i), "Card"));
        }
        let view = GameView {
            players: vec![player],
            ..GameView::default()
        };
        let copy = view.clone();
        assert_eq!(copy, view);
        assert_eq!(copy.players[0].hand.len(), 50);
    }
}
