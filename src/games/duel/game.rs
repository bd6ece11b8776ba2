//! Duel rules engine.

use im::Vector;
use rustc_hash::FxHashMap;

use crate::core::{GameRng, MatchConfig, ObjectId, PlayerId, PlayerMap};
use crate::error::EngineFault;
use crate::rules::{
    Answer, CardView, Candidate, Decider, Engine, EngineFactory, GameView, MatchResult, Phase,
    PlayChoice, PlayKind, PlayerView, Purpose, Query, Target,
};

use super::cards::{decklist, CardDef, CardId, CardPool, Effect, DECK_NAMES};

#[derive(Clone, Debug)]
struct Permanent {
    id: ObjectId,
    card: CardId,
    tapped: bool,
    /// Entered this turn; cannot attack or use tap abilities.
    sick: bool,
    damage: i32,
}

#[derive(Clone, Debug)]
struct Seat {
    name: String,
    deck: String,
    life: i32,
    library: Vector<ObjectId>,
    hand: Vector<ObjectId>,
    graveyard: Vector<ObjectId>,
    battlefield: Vector<Permanent>,
    land_played: bool,
    /// Tried to draw from an empty library.
    decked: bool,
    rng: GameRng,
}

/// A two-seat duel of lands, creatures and sorceries.
///
/// ## Turn structure
///
/// untap → upkeep → draw (skipped by the starting player on turn 1) →
/// main 1 → combat (attackers, then one blocker per attacker) → main 2 →
/// end → cleanup (discard to maximum hand size)
///
/// Only the active player receives priority, in main phases. Spells and
/// abilities resolve immediately; there is no stack.
pub struct DuelEngine {
    pool: CardPool,
    cards: FxHashMap<ObjectId, CardId>,
    seats: PlayerMap<Seat>,
    turn: u32,
    phase: Phase,
    active: PlayerId,
    priority: Option<PlayerId>,
    hand_size: usize,
    max_hand_size: usize,
    max_turns: u32,
}

impl DuelEngine {
    /// Build a match from `config`: decks are created, shuffled and the
    /// starting player is chosen; nothing is drawn until `run`.
    pub fn new(config: &MatchConfig) -> Result<Self, EngineFault> {
        if config.seats.len() != 2 {
            return Err(EngineFault::Config(format!(
                "a duel needs 2 seats, got {}",
                config.seats.len()
            )));
        }

        let pool = CardPool::standard();
        let root = GameRng::new(config.seed);
        let mut cards = FxHashMap::default();
        let mut next_id = 1u32;
        let mut seats = Vec::with_capacity(2);

        for (index, seat) in config.seats.iter().enumerate() {
            let list = decklist(&seat.deck).ok_or_else(|| {
                EngineFault::Config(format!(
                    "unknown deck '{}', expected one of {:?}",
                    seat.deck, DECK_NAMES
                ))
            })?;

            let mut library = Vec::new();
            for (card, count) in list {
                for _ in 0..count {
                    let id = ObjectId(next_id);
                    next_id += 1;
                    cards.insert(id, card);
                    library.push(id);
                }
            }
            let mut rng = root.for_context(&format!("library-{}", index));
            rng.shuffle(&mut library);

            seats.push(Seat {
                name: seat.name.clone(),
                deck: seat.deck.clone(),
                life: config.starting_life,
                library: library.into_iter().collect(),
                hand: Vector::new(),
                graveyard: Vector::new(),
                battlefield: Vector::new(),
                land_played: false,
                decked: false,
                rng,
            });
        }

        let mut coin = root.for_context("coin");
        let active = PlayerId::new(if coin.gen_bool(0.5) { 0 } else { 1 });
        let seats = PlayerMap::from_vec(seats);

        Ok(Self {
            pool,
            cards,
            seats,
            turn: 0,
            phase: Phase::Setup,
            active,
            priority: None,
            hand_size: config.hand_size,
            max_hand_size: config.max_hand_size,
            max_turns: config.max_turns,
        })
    }

    /// Seat that takes the first turn.
    #[must_use]
    pub fn starting_player(&self) -> PlayerId {
        self.active
    }

    fn def(&self, object: ObjectId) -> Option<&CardDef> {
        self.cards.get(&object).and_then(|card| self.pool.get(*card))
    }

    fn name(&self, object: ObjectId) -> String {
        self.def(object).map_or_else(|| object.to_string(), |d| d.name.to_string())
    }

    fn opponent(&self, player: PlayerId) -> PlayerId {
        player.next(2)
    }

    // === Outcome ===

    fn lost(&self, player: PlayerId) -> bool {
        let seat = &self.seats[player];
        seat.life <= 0 || seat.decked
    }

    fn outcome(&self) -> Option<MatchResult> {
        let first = PlayerId::new(0);
        let second = PlayerId::new(1);
        match (self.lost(first), self.lost(second)) {
            (true, true) => Some(MatchResult::Draw),
            (true, false) => Some(MatchResult::Winner(second)),
            (false, true) => Some(MatchResult::Winner(first)),
            (false, false) => None,
        }
    }

    fn stopped(&self, decider: &dyn Decider) -> bool {
        self.outcome().is_some() || decider.halted()
    }

    // === Zones ===

    fn draw(&mut self, player: PlayerId, count: u32) {
        let seat = &mut self.seats[player];
        for _ in 0..count {
            match seat.library.pop_front() {
                Some(card) => seat.hand.push_back(card),
                None => seat.decked = true,
            }
        }
    }

    fn untapped_lands(&self, player: PlayerId) -> u32 {
        self.seats[player]
            .battlefield
            .iter()
            .filter(|p| !p.tapped && self.pool.get(p.card).is_some_and(CardDef::is_land))
            .count() as u32
    }

    fn pay(&mut self, player: PlayerId, mut mana: u32) {
        let pool = &self.pool;
        for permanent in self.seats[player].battlefield.iter_mut() {
            if mana == 0 {
                break;
            }
            if !permanent.tapped && pool.get(permanent.card).is_some_and(CardDef::is_land) {
                permanent.tapped = true;
                mana -= 1;
            }
        }
    }

    /// Move dead creatures to their owners' graveyards.
    fn check_creatures(&mut self) {
        for player in PlayerId::all(2) {
            let pool = &self.pool;
            let seat = &mut self.seats[player];
            let (dead, alive): (Vector<Permanent>, Vector<Permanent>) =
                seat.battlefield.clone().into_iter().partition(|p| {
                    pool.get(p.card)
                        .and_then(CardDef::stats)
                        .is_some_and(|(_, toughness)| p.damage >= toughness)
                });
            for permanent in dead.iter() {
                log::trace!("{} dies", permanent.id);
                seat.graveyard.push_back(permanent.id);
            }
            seat.battlefield = alive;
        }
    }

    fn find_permanent(&mut self, object: ObjectId) -> Option<&mut Permanent> {
        let owner = PlayerId::all(2).find(|&p| self.seats[p].battlefield.iter().any(|x| x.id == object))?;
        self.seats[owner].battlefield.iter_mut().find(|p| p.id == object)
    }

    // === Decisions ===

    fn playable(&self, player: PlayerId) -> Vec<PlayChoice> {
        let seat = &self.seats[player];
        let mana = self.untapped_lands(player);
        let mut choices = Vec::new();

        for (position, &object) in seat.hand.iter().enumerate() {
            let Some(def) = self.def(object) else { continue };
            if def.is_land() {
                if !seat.land_played {
                    choices.push(PlayChoice::play_land(object, def.name, position));
                }
            } else if def.cost <= mana {
                choices.push(PlayChoice::cast(object, def.name, position));
            }
        }

        for (position, permanent) in seat.battlefield.iter().enumerate() {
            let Some(def) = self.pool.get(permanent.card) else { continue };
            for (index, ability) in def.abilities.iter().enumerate() {
                let ready = !ability.tap || (!permanent.tapped && !permanent.sick);
                if ready && ability.mana <= mana {
                    choices.push(PlayChoice::activate(
                        permanent.id,
                        def.name,
                        position,
                        index as u8,
                        ability.text,
                    ));
                }
            }
        }
        choices
    }

    fn priority_loop(&mut self, decider: &mut dyn Decider) {
        let player = self.active;
        loop {
            if self.stopped(decider) {
                break;
            }
            let choices = self.playable(player);
            self.priority = Some(player);
            let query = Query::Priority {
                player,
                choices: choices.clone(),
            };
            match decider.decide(&self.view(), &query) {
                Answer::Play(i) => match choices.get(i) {
                    Some(choice) => self.take(player, choice, decider),
                    None => break,
                },
                _ => break,
            }
        }
        self.priority = None;
    }

    fn take(&mut self, player: PlayerId, choice: &PlayChoice, decider: &mut dyn Decider) {
        log::trace!("{} takes {:?} {}", player, choice.kind, choice.name);
        match choice.kind {
            PlayKind::PlayLand => {
                let Some(&card) = self.cards.get(&choice.object) else { return };
                let seat = &mut self.seats[player];
                seat.hand.remove(choice.position);
                seat.land_played = true;
                seat.battlefield.push_back(Permanent {
                    id: choice.object,
                    card,
                    tapped: false,
                    sick: false,
                    damage: 0,
                });
            }
            PlayKind::Cast => {
                let Some(def) = self.def(choice.object).cloned() else { return };
                self.pay(player, def.cost);
                self.seats[player].hand.remove(choice.position);
                if def.stats().is_some() {
                    self.seats[player].battlefield.push_back(Permanent {
                        id: choice.object,
                        card: def.id,
                        tapped: false,
                        sick: true,
                        damage: 0,
                    });
                    if def.enter_draw {
                        self.enter_trigger(player, choice.object, decider);
                    }
                } else {
                    if let Some(effect) = def.effect {
                        self.resolve(player, choice.object, effect, decider);
                    }
                    self.seats[player].graveyard.push_back(choice.object);
                }
            }
            PlayKind::Activate => {
                let Some(def) = self.def(choice.object).cloned() else { return };
                let Some(ability) = def.abilities.get(choice.ability as usize).copied() else { return };
                self.pay(player, ability.mana);
                if ability.tap {
                    if let Some(source) = self.seats[player].battlefield.get_mut(choice.position) {
                        source.tapped = true;
                    }
                }
                self.resolve(player, choice.object, ability.effect, decider);
            }
        }
        self.check_creatures();
    }

    fn enter_trigger(&mut self, player: PlayerId, source: ObjectId, decider: &mut dyn Decider) {
        let query = Query::Confirm {
            player,
            purpose: Purpose::OptionalTrigger { source },
            text: format!("{}: draw a card?", self.name(source)),
            fallback: false,
        };
        if decider.decide(&self.view(), &query) == Answer::Binary(true) {
            self.draw(player, 1);
        }
    }

    fn resolve(&mut self, player: PlayerId, source: ObjectId, effect: Effect, decider: &mut dyn Decider) {
        match effect {
            Effect::Damage(amount) => {
                if let Some(target) = self.choose_target(player, source, amount, decider) {
                    match target {
                        Target::Player(victim) => self.seats[victim].life -= amount,
                        Target::Object(object) => {
                            if let Some(permanent) = self.find_permanent(object) {
                                permanent.damage += amount;
                            }
                        }
                    }
                }
            }
            Effect::Draw(count) => self.draw(player, count),
            Effect::GainLife(amount) => self.seats[player].life += amount,
        }
    }

    fn choose_target(
        &mut self,
        player: PlayerId,
        source: ObjectId,
        amount: i32,
        decider: &mut dyn Decider,
    ) -> Option<Target> {
        let mut candidates: Vec<Candidate> = PlayerId::all(2)
            .map(|p| Candidate::player(p, self.seats[p].name.clone()))
            .collect();
        for p in PlayerId::all(2) {
            for permanent in self.seats[p].battlefield.iter() {
                if self.pool.get(permanent.card).is_some_and(|d| d.stats().is_some()) {
                    candidates.push(Candidate::object(permanent.id, self.name(permanent.id)));
                }
            }
        }

        let query = Query::Select {
            player,
            purpose: Purpose::Targets { source },
            text: format!("{}: deal {} damage to any target", self.name(source), amount),
            candidates: candidates.clone(),
            min: 1,
            max: 1,
        };
        match decider.decide(&self.view(), &query) {
            Answer::Selection(picked) => picked
                .first()
                .and_then(|&i| candidates.get(i))
                .map(|c| c.target),
            _ => None,
        }
    }

    // === Turn structure ===

    fn mulligans(&mut self, decider: &mut dyn Decider) {
        for player in [self.active, self.opponent(self.active)] {
            self.draw(player, self.hand_size as u32);
            if self.stopped(decider) {
                return;
            }

            let query = Query::Confirm {
                player,
                purpose: Purpose::Mulligan,
                text: format!("Keep this hand of {} cards?", self.seats[player].hand.len()),
                fallback: true,
            };
            if decider.decide(&self.view(), &query) == Answer::Binary(false) {
                let seat = &mut self.seats[player];
                let mut library: Vec<ObjectId> = seat.library.iter().copied().collect();
                library.extend(seat.hand.iter().copied());
                seat.hand.clear();
                seat.rng.shuffle(&mut library);
                seat.library = library.into_iter().collect();
                self.draw(player, self.hand_size.saturating_sub(1) as u32);
            }
        }
    }

    fn combat(&mut self, decider: &mut dyn Decider) {
        let attacker_seat = self.active;
        let defender_seat = self.opponent(attacker_seat);

        self.phase = Phase::BeginCombat;
        let ready: Vec<ObjectId> = self.seats[attacker_seat]
            .battlefield
            .iter()
            .filter(|p| !p.tapped && !p.sick && self.pool.get(p.card).is_some_and(|d| d.stats().is_some()))
            .map(|p| p.id)
            .collect();
        if ready.is_empty() {
            self.phase = Phase::EndCombat;
            return;
        }

        self.phase = Phase::DeclareAttackers;
        let query = Query::Select {
            player: attacker_seat,
            purpose: Purpose::Attackers,
            text: "Declare attackers".to_string(),
            candidates: ready.iter().map(|&id| Candidate::object(id, self.name(id))).collect(),
            min: 0,
            max: ready.len(),
        };
        let attackers: Vec<ObjectId> = match decider.decide(&self.view(), &query) {
            Answer::Selection(picked) => picked.iter().filter_map(|&i| ready.get(i).copied()).collect(),
            _ => Vec::new(),
        };
        if attackers.is_empty() || self.stopped(decider) {
            self.phase = Phase::EndCombat;
            return;
        }
        for &attacker in &attackers {
            if let Some(permanent) = self.find_permanent(attacker) {
                permanent.tapped = true;
            }
        }

        self.phase = Phase::DeclareBlockers;
        let mut blocks: Vec<(ObjectId, Option<ObjectId>)> = Vec::with_capacity(attackers.len());
        for &attacker in &attackers {
            let free: Vec<ObjectId> = self.seats[defender_seat]
                .battlefield
                .iter()
                .filter(|p| {
                    !p.tapped
                        && self.pool.get(p.card).is_some_and(|d| d.stats().is_some())
                        && !blocks.iter().any(|(_, b)| *b == Some(p.id))
                })
                .map(|p| p.id)
                .collect();
            let blocker = if free.is_empty() || self.stopped(decider) {
                None
            } else {
                let query = Query::Select {
                    player: defender_seat,
                    purpose: Purpose::Blockers { attacker },
                    text: format!("Block {}?", self.name(attacker)),
                    candidates: free.iter().map(|&id| Candidate::object(id, self.name(id))).collect(),
                    min: 0,
                    max: 1,
                };
                match decider.decide(&self.view(), &query) {
                    Answer::Selection(picked) => picked.first().and_then(|&i| free.get(i).copied()),
                    _ => None,
                }
            };
            blocks.push((attacker, blocker));
        }

        self.phase = Phase::CombatDamage;
        for (attacker, blocker) in blocks {
            let power = |engine: &Self, id: ObjectId| engine.def(id).and_then(CardDef::stats).map_or(0, |s| s.0);
            let attack = power(self, attacker);
            match blocker {
                None => self.seats[defender_seat].life -= attack,
                Some(blocker) => {
                    let defend = power(self, blocker);
                    if let Some(p) = self.find_permanent(blocker) {
                        p.damage += attack;
                    }
                    if let Some(p) = self.find_permanent(attacker) {
                        p.damage += defend;
                    }
                }
            }
        }
        self.check_creatures();
        self.phase = Phase::EndCombat;
    }

    fn cleanup(&mut self, decider: &mut dyn Decider) {
        self.phase = Phase::Cleanup;
        let player = self.active;
        let excess = self.seats[player].hand.len().saturating_sub(self.max_hand_size);
        if excess > 0 && !decider.halted() {
            let hand: Vec<ObjectId> = self.seats[player].hand.iter().copied().collect();
            let query = Query::Select {
                player,
                purpose: Purpose::Discard,
                text: format!("Discard {} card(s)", excess),
                candidates: hand.iter().map(|&id| Candidate::object(id, self.name(id))).collect(),
                min: excess,
                max: excess,
            };
            let mut discard: Vec<ObjectId> = match decider.decide(&self.view(), &query) {
                Answer::Selection(picked) => picked.iter().filter_map(|&i| hand.get(i).copied()).collect(),
                _ => Vec::new(),
            };
            // Unanswered or short answers discard from the front.
            for &id in &hand {
                if discard.len() >= excess {
                    break;
                }
                if !discard.contains(&id) {
                    discard.push(id);
                }
            }
            let seat = &mut self.seats[player];
            seat.hand.retain(|id| !discard.contains(id));
            seat.graveyard.extend(discard);
        }

        for p in PlayerId::all(2) {
            for permanent in self.seats[p].battlefield.iter_mut() {
                permanent.damage = 0;
            }
        }
    }

    fn take_turn(&mut self, decider: &mut dyn Decider) {
        let player = self.active;
        log::trace!("turn {} for {}", self.turn, player);

        self.phase = Phase::Untap;
        {
            let seat = &mut self.seats[player];
            seat.land_played = false;
            for permanent in seat.battlefield.iter_mut() {
                permanent.tapped = false;
                permanent.sick = false;
            }
        }

        self.phase = Phase::Upkeep;
        self.phase = Phase::Draw;
        if self.turn > 1 {
            self.draw(player, 1);
        }

        if self.stopped(decider) {
            return;
        }
        self.phase = Phase::Main1;
        self.priority_loop(decider);
        if self.stopped(decider) {
            return;
        }
        self.combat(decider);
        if self.stopped(decider) {
            return;
        }
        self.phase = Phase::Main2;
        self.priority_loop(decider);
        if self.stopped(decider) {
            return;
        }

        self.phase = Phase::End;
        self.cleanup(decider);
        self.active = self.opponent(player);
    }
}

impl Engine for DuelEngine {
    fn run(&mut self, decider: &mut dyn Decider) -> Result<MatchResult, EngineFault> {
        self.mulligans(decider);
        loop {
            if let Some(result) = self.outcome() {
                return Ok(result);
            }
            if decider.halted() {
                return Ok(MatchResult::Aborted);
            }
            if self.max_turns > 0 && self.turn >= self.max_turns {
                return Ok(MatchResult::Truncated);
            }
            self.turn += 1;
            self.take_turn(decider);
        }
    }

    fn view(&self) -> GameView {
        let card = |id: ObjectId| CardView::new(id, self.name(id));
        let players = self
            .seats
            .iter()
            .map(|(player, seat)| {
                let mut view = PlayerView::new(player, seat.name.clone(), seat.deck.clone(), seat.life);
                view.library = seat.library.len();
                view.hand = seat.hand.iter().map(|&id| card(id)).collect();
                view.graveyard = seat.graveyard.iter().map(|&id| card(id)).collect();
                view.battlefield = seat
                    .battlefield
                    .iter()
                    .map(|p| CardView {
                        tapped: p.tapped,
                        stats: self.pool.get(p.card).and_then(CardDef::stats),
                        ..card(p.id)
                    })
                    .collect();
                view
            })
            .collect();

        GameView {
            turn: self.turn,
            phase: self.phase,
            active: self.active,
            priority: self.priority,
            stack: 0,
            players,
        }
    }
}

/// Creates a [`DuelEngine`] per episode.
#[derive(Clone, Copy, Debug, Default)]
pub struct DuelFactory;

impl DuelFactory {
    pub fn new() -> Self {
        Self
    }
}

impl EngineFactory for DuelFactory {
    fn create(&self, config: &MatchConfig) -> Result<Box<dyn Engine>, EngineFault> {
        Ok(Box::new(DuelEngine::new(config)?))
    }
}
