//! Card pool and decklists of the duel.
//!
//! Definitions are static: "Shock" always costs 1 and deals 2 damage.
//! Per-game data (tapped, damage, summoning sickness) lives in the engine's
//! permanents.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Identifier of a card definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId(pub u16);

/// What a card is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardKind {
    /// Taps for one mana.
    Land,
    Creature { power: i32, toughness: i32 },
    /// One-shot spell, cast in a main phase.
    Sorcery,
}

/// What resolving a spell or ability does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Damage to any target: a player or a creature.
    Damage(i32),
    Draw(u32),
    GainLife(i32),
}

impl Effect {
    /// Whether the effect asks for a target.
    #[must_use]
    pub fn targeted(self) -> bool {
        matches!(self, Effect::Damage(_))
    }
}

/// Activated ability of a permanent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ability {
    pub mana: u32,
    /// Requires tapping the source, so it cannot be used while summoning sick.
    pub tap: bool,
    pub effect: Effect,
    pub text: &'static str,
}

/// Static card definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardDef {
    pub id: CardId,
    pub name: &'static str,
    pub cost: u32,
    pub kind: CardKind,
    /// Spell effect for sorceries.
    pub effect: Option<Effect>,
    pub abilities: SmallVec<[Ability; 2]>,
    /// "When this enters, you may draw a card."
    pub enter_draw: bool,
}

impl CardDef {
    fn new(id: u16, name: &'static str, cost: u32, kind: CardKind) -> Self {
        Self {
            id: CardId(id),
            name,
            cost,
            kind,
            effect: None,
            abilities: SmallVec::new(),
            enter_draw: false,
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    fn with_ability(mut self, mana: u32, tap: bool, effect: Effect, text: &'static str) -> Self {
        self.abilities.push(Ability {
            mana,
            tap,
            effect,
            text,
        });
        self
    }

    fn with_enter_draw(mut self) -> Self {
        self.enter_draw = true;
        self
    }

    #[must_use]
    pub fn is_land(&self) -> bool {
        self.kind == CardKind::Land
    }

    #[must_use]
    pub fn stats(&self) -> Option<(i32, i32)> {
        match self.kind {
            CardKind::Creature { power, toughness } => Some((power, toughness)),
            _ => None,
        }
    }
}

pub const MOUNTAIN: CardId = CardId(0);
pub const FOREST: CardId = CardId(1);
pub const ISLAND: CardId = CardId(2);
pub const GOBLIN_RAIDER: CardId = CardId(10);
pub const GRIZZLY_BEARS: CardId = CardId(11);
pub const HILL_GIANT: CardId = CardId(12);
pub const PRODIGAL_PYROMANCER: CardId = CardId(13);
pub const MIND_ADEPT: CardId = CardId(14);
pub const ELVISH_VISIONARY: CardId = CardId(15);
pub const SHOCK: CardId = CardId(20);
pub const DIVINATION: CardId = CardId(21);
pub const HEALING_SALVE: CardId = CardId(22);

/// Every card the duel knows, by id.
#[derive(Clone, Debug)]
pub struct CardPool {
    cards: FxHashMap<CardId, CardDef>,
}

impl Default for CardPool {
    fn default() -> Self {
        Self::standard()
    }
}

impl CardPool {
    /// The fixed duel card pool.
    #[must_use]
    pub fn standard() -> Self {
        use CardKind::*;

        let defs = [
            CardDef::new(MOUNTAIN.0, "Mountain", 0, Land),
            CardDef::new(FOREST.0, "Forest", 0, Land),
            CardDef::new(ISLAND.0, "Island", 0, Land),
            CardDef::new(GOBLIN_RAIDER.0, "Goblin Raider", 1, Creature { power: 2, toughness: 1 }),
            CardDef::new(GRIZZLY_BEARS.0, "Grizzly Bears", 2, Creature { power: 2, toughness: 2 }),
            CardDef::new(HILL_GIANT.0, "Hill Giant", 4, Creature { power: 3, toughness: 3 }),
            CardDef::new(
                PRODIGAL_PYROMANCER.0,
                "Prodigal Pyromancer",
                3,
                Creature { power: 1, toughness: 1 },
            )
            .with_ability(0, true, Effect::Damage(1), "{T}: deal 1 damage to any target"),
            CardDef::new(MIND_ADEPT.0, "Mind Adept", 2, Creature { power: 1, toughness: 2 })
                .with_ability(0, true, Effect::GainLife(1), "{T}: you gain 1 life")
                .with_ability(2, true, Effect::Draw(1), "{2}, {T}: draw a card"),
            CardDef::new(ELVISH_VISIONARY.0, "Elvish Visionary", 2, Creature { power: 1, toughness: 1 })
                .with_enter_draw(),
            CardDef::new(SHOCK.0, "Shock", 1, Sorcery).with_effect(Effect::Damage(2)),
            CardDef::new(DIVINATION.0, "Divination", 3, Sorcery).with_effect(Effect::Draw(2)),
            CardDef::new(HEALING_SALVE.0, "Healing Salve", 1, Sorcery).with_effect(Effect::GainLife(3)),
        ];

        Self {
            cards: defs.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDef> {
        self.cards.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Names accepted as `SeatConfig::deck`.
pub const DECK_NAMES: [&str; 3] = ["aggro", "control", "midrange"];

/// Card counts of a named deck, in list order.
#[must_use]
pub fn decklist(name: &str) -> Option<Vec<(CardId, usize)>> {
    let list = match name {
        "aggro" => vec![
            (MOUNTAIN, 17),
            (GOBLIN_RAIDER, 8),
            (GRIZZLY_BEARS, 6),
            (SHOCK, 6),
            (PRODIGAL_PYROMANCER, 3),
        ],
        "control" => vec![
            (ISLAND, 18),
            (MIND_ADEPT, 4),
            (ELVISH_VISIONARY, 4),
            (DIVINATION, 4),
            (HEALING_SALVE, 4),
            (HILL_GIANT, 4),
            (SHOCK, 2),
        ],
        "midrange" => vec![
            (FOREST, 17),
            (GRIZZLY_BEARS, 6),
            (HILL_GIANT, 4),
            (ELVISH_VISIONARY, 4),
            (PRODIGAL_PYROMANCER, 3),
            (MIND_ADEPT, 3),
            (SHOCK, 3),
        ],
        _ => return None,
    };
    Some(list)
}
