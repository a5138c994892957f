//! The reference board.
//!
//! `Game` is the collaborator the rule core runs against. It owns:
//! - Heroes and their per-player boards (ordered minion lists)
//! - Minions and their stats
//! - One dispatch surface per entity
//! - The active-aura registry and the effects attached to each entity
//!
//! It is deliberately not a game loop: game code summons, damages and ends
//! turns through it, and those calls fire the occurrences rules listen to.
//!
//! ## Stat Values (i64 only)
//!
//! Entity stats live in a `FxHashMap<String, i64>`. Well-known keys are in
//! [`stat`]. Flags are counters: taunt is active while `taunt > 0`, so
//! stacked grants reverse exactly.

use im::Vector;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::config::GameConfig;
use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap};
use crate::effects::{Aura, AuraId, AuraSlot, Effect};
use crate::error::{EngineError, Result};
use crate::triggers::{Dispatcher, EventArgs, Listener, ListenerId, ListenerList};

/// Well-known stat keys.
pub mod stat {
    pub const ATTACK: &str = "attack";
    pub const HEALTH: &str = "health";
    pub const MAX_HEALTH: &str = "max_health";
    pub const TAUNT: &str = "taunt";
}

/// Well-known occurrence names fired by the board itself.
pub mod occurrence {
    /// Fired on the damaged entity. focus = victim, other = source.
    pub const DAMAGED: &str = "damaged";
    /// Fired on the victim's controller. Same payload as `DAMAGED`.
    pub const CHARACTER_DAMAGED: &str = "character_damaged";
    /// Fired on the player whose turn ends. focus = that player's hero.
    pub const TURN_ENDED: &str = "turn_ended";
    /// Fired on the player whose turn begins. focus = that player's hero.
    pub const TURN_STARTED: &str = "turn_started";
    /// Fired on the controller when one of its minions is summoned.
    pub const MINION_SUMMONED: &str = "minion_summoned";
}

/// Entity stat storage.
pub type Stats = FxHashMap<String, i64>;

/// A minion on the board.
#[derive(Debug)]
pub struct Minion {
    pub entity_id: EntityId,
    pub name: String,
    pub controller: PlayerId,
    pub stats: Stats,
    pub events: Dispatcher,
    effects: Vec<Effect>,
}

impl Minion {
    /// Get a stat, 0 when unset.
    #[must_use]
    pub fn stat(&self, key: &str) -> i64 {
        self.stats.get(key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has_taunt(&self) -> bool {
        self.stat(stat::TAUNT) > 0
    }

    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.stat(stat::HEALTH) < self.stat(stat::MAX_HEALTH)
    }

    /// Number of effects currently attached.
    #[must_use]
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }
}

/// A player: hero stats, board, dispatch surface and active auras.
#[derive(Debug)]
pub struct PlayerState {
    pub player: PlayerId,
    pub stats: Stats,
    /// Minions in board order (left to right).
    pub board: Vector<EntityId>,
    pub events: Dispatcher,
    auras: Vec<AuraId>,
    effects: Vec<Effect>,
}

impl PlayerState {
    fn new(player: PlayerId, hero_health: i64) -> Self {
        let mut stats = Stats::default();
        stats.insert(stat::HEALTH.to_string(), hero_health);
        stats.insert(stat::MAX_HEALTH.to_string(), hero_health);
        stats.insert(stat::ATTACK.to_string(), 0);

        Self {
            player,
            stats,
            board: Vector::new(),
            events: Dispatcher::new(),
            auras: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Get a hero stat, 0 when unset.
    #[must_use]
    pub fn stat(&self, key: &str) -> i64 {
        self.stats.get(key).copied().unwrap_or(0)
    }

    /// Active auras held by this player, oldest first.
    #[must_use]
    pub fn auras(&self) -> &[AuraId] {
        &self.auras
    }
}

struct ActiveAura {
    slot: AuraSlot,
    aura: Box<dyn Aura>,
}

/// The board rules are bound to and act upon.
pub struct Game {
    config: GameConfig,
    players: PlayerMap<PlayerState>,
    minions: FxHashMap<EntityId, Minion>,
    auras: FxHashMap<AuraId, ActiveAura>,
    active_player: PlayerId,
    turn_number: u32,
    next_entity_id: u32,
    next_listener_id: u64,
    next_aura_id: u32,
    /// (surface, event) pairs currently being dispatched, outermost first.
    dispatching: Vec<(EntityId, String)>,
}

impl Game {
    /// Create an empty board.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let hero_health = config.hero_health;
        Self {
            players: PlayerMap::new(config.player_count, |p| PlayerState::new(p, hero_health)),
            next_entity_id: EntityId::first_minion(config.player_count),
            config,
            minions: FxHashMap::default(),
            auras: FxHashMap::default(),
            active_player: PlayerId::new(0),
            turn_number: 1,
            next_listener_id: 0,
            next_aura_id: 0,
            dispatching: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.config.player_count
    }

    #[must_use]
    pub fn active_player(&self) -> PlayerId {
        self.active_player
    }

    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    // === Entities ===

    /// Summon a minion at the right end of `player`'s board.
    pub fn summon(
        &mut self,
        player: PlayerId,
        name: impl Into<String>,
        attack: i64,
        health: i64,
    ) -> Result<EntityId> {
        self.summon_at(player, None, name, attack, health)
    }

    /// Summon a minion at `position` (clamped to the board), or at the end.
    ///
    /// Fires `minion_summoned` on the controller with the new minion as focus.
    pub fn summon_at(
        &mut self,
        player: PlayerId,
        position: Option<usize>,
        name: impl Into<String>,
        attack: i64,
        health: i64,
    ) -> Result<EntityId> {
        let hero = EntityId::player(player);
        let board_len = self
            .players
            .get(player)
            .ok_or(EngineError::NotAPlayer(hero))?
            .board
            .len();

        let entity_id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;

        let mut stats = Stats::default();
        stats.insert(stat::ATTACK.to_string(), attack);
        stats.insert(stat::HEALTH.to_string(), health);
        stats.insert(stat::MAX_HEALTH.to_string(), health);

        let minion = Minion {
            entity_id,
            name: name.into(),
            controller: player,
            stats,
            events: Dispatcher::new(),
            effects: Vec::new(),
        };
        debug!(minion = %entity_id, name = %minion.name, %player, "summoned");
        self.minions.insert(entity_id, minion);

        let index = position.map_or(board_len, |p| p.min(board_len));
        self.players[player].board.insert(index, entity_id);

        self.fire(hero, occurrence::MINION_SUMMONED, &EventArgs::new().with_focus(entity_id))?;
        Ok(entity_id)
    }

    /// Remove a minion from play.
    ///
    /// Its attached effects are unapplied and every aura it owns is removed
    /// before it leaves the board.
    pub fn remove_minion(&mut self, id: EntityId) -> Result<Minion> {
        if !self.minions.contains_key(&id) {
            return Err(EngineError::UnknownEntity(id));
        }

        self.detach_effects(id)?;

        let mut owned: Vec<AuraId> = self
            .auras
            .iter()
            .filter(|(_, active)| active.slot.owner == id)
            .map(|(aura_id, _)| *aura_id)
            .collect();
        owned.sort();
        for aura_id in owned {
            self.remove_aura(aura_id)?;
        }

        let minion = self.minions.remove(&id).ok_or(EngineError::UnknownEntity(id))?;
        let board = &mut self.players[minion.controller].board;
        if let Some(pos) = board.index_of(&id) {
            board.remove(pos);
        }
        debug!(minion = %id, "removed from play");
        Ok(minion)
    }

    /// Check if an entity is a player or a minion in play.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        entity.is_player(self.player_count()) || self.minions.contains_key(&entity)
    }

    #[must_use]
    pub fn is_minion(&self, entity: EntityId) -> bool {
        self.minions.contains_key(&entity)
    }

    #[must_use]
    pub fn minion(&self, id: EntityId) -> Option<&Minion> {
        self.minions.get(&id)
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> Option<&PlayerState> {
        self.players.get(player)
    }

    /// The player controlling `entity` (a hero controls itself).
    #[must_use]
    pub fn controller_of(&self, entity: EntityId) -> Option<PlayerId> {
        entity
            .as_player(self.player_count())
            .or_else(|| self.minions.get(&entity).map(|m| m.controller))
    }

    /// Snapshot of `player`'s board in order. Empty for unknown players.
    ///
    /// The returned vector is an O(1) persistent copy; mutating the board
    /// while iterating it is safe.
    #[must_use]
    pub fn player_minions(&self, player: PlayerId) -> Vector<EntityId> {
        self.players
            .get(player)
            .map(|p| p.board.clone())
            .unwrap_or_default()
    }

    // === Stats ===

    /// Stats of a hero or minion.
    #[must_use]
    pub fn stats(&self, entity: EntityId) -> Option<&Stats> {
        match entity.as_player(self.player_count()) {
            Some(player) => self.players.get(player).map(|p| &p.stats),
            None => self.minions.get(&entity).map(|m| &m.stats),
        }
    }

    fn stats_mut(&mut self, entity: EntityId) -> Result<&mut Stats> {
        let stats = match entity.as_player(self.player_count()) {
            Some(player) => self.players.get_mut(player).map(|p| &mut p.stats),
            None => self.minions.get_mut(&entity).map(|m| &mut m.stats),
        };
        stats.ok_or(EngineError::UnknownEntity(entity))
    }

    /// Read one stat. `None` if the entity is not in play; 0 if unset.
    #[must_use]
    pub fn stat(&self, entity: EntityId, key: &str) -> Option<i64> {
        self.stats(entity).map(|s| s.get(key).copied().unwrap_or(0))
    }

    /// Add `delta` to a stat and return the new value.
    ///
    /// Leaves the stat untouched and returns `StatOverflow` if the result
    /// does not fit.
    pub fn modify_stat(&mut self, entity: EntityId, key: &str, delta: i64) -> Result<i64> {
        self.update_stat(entity, key, |value| value.checked_add(delta))
    }

    /// Subtract `delta` from a stat and return the new value.
    pub fn reduce_stat(&mut self, entity: EntityId, key: &str, delta: i64) -> Result<i64> {
        self.update_stat(entity, key, |value| value.checked_sub(delta))
    }

    fn update_stat(
        &mut self,
        entity: EntityId,
        key: &str,
        update: impl FnOnce(i64) -> Option<i64>,
    ) -> Result<i64> {
        let stats = self.stats_mut(entity)?;
        let current = stats.get(key).copied().unwrap_or(0);
        let value = update(current).ok_or_else(|| EngineError::StatOverflow {
            entity,
            key: key.to_string(),
        })?;
        stats.insert(key.to_string(), value);
        Ok(value)
    }

    /// Overwrite a stat.
    pub fn set_stat(&mut self, entity: EntityId, key: &str, value: i64) -> Result<()> {
        self.stats_mut(entity)?.insert(key.to_string(), value);
        Ok(())
    }

    // === Occurrences ===

    /// Damage a hero or minion and notify listeners.
    pub fn deal_damage(&mut self, source: Option<EntityId>, target: EntityId, amount: i64) -> Result<()> {
        self.reduce_stat(target, stat::HEALTH, amount)?;

        let mut args = EventArgs::new().with_focus(target).with_amount(amount);
        args.other = source;

        self.fire(target, occurrence::DAMAGED, &args)?;
        if let Some(controller) = self.controller_of(target) {
            self.fire(EntityId::player(controller), occurrence::CHARACTER_DAMAGED, &args)?;
        }
        Ok(())
    }

    /// End the active player's turn and start the next player's.
    pub fn end_turn(&mut self) -> Result<()> {
        let ending = EntityId::player(self.active_player);
        self.fire(ending, occurrence::TURN_ENDED, &EventArgs::new().with_focus(ending))?;

        self.active_player = self.active_player.next(self.player_count());
        self.turn_number += 1;

        let starting = EntityId::player(self.active_player);
        self.fire(starting, occurrence::TURN_STARTED, &EventArgs::new().with_focus(starting))
    }

    // === Dispatch ===

    /// The dispatch surface of a hero or minion.
    pub fn dispatcher(&self, entity: EntityId) -> Result<&Dispatcher> {
        let dispatcher = match entity.as_player(self.player_count()) {
            Some(player) => self.players.get(player).map(|p| &p.events),
            None => self.minions.get(&entity).map(|m| &m.events),
        };
        dispatcher.ok_or(EngineError::UnknownEntity(entity))
    }

    fn dispatcher_mut(&mut self, entity: EntityId) -> Result<&mut Dispatcher> {
        let dispatcher = match entity.as_player(self.player_count()) {
            Some(player) => self.players.get_mut(player).map(|p| &mut p.events),
            None => self.minions.get_mut(&entity).map(|m| &mut m.events),
        };
        dispatcher.ok_or(EngineError::UnknownEntity(entity))
    }

    /// Subscribe `listener` to `event_name` on `surface`.
    pub fn bind(&mut self, surface: EntityId, event_name: &str, listener: Listener) -> Result<ListenerId> {
        let id = ListenerId(self.next_listener_id);
        self.dispatcher_mut(surface)?.bind(event_name, id, listener);
        self.next_listener_id += 1;
        Ok(id)
    }

    /// Remove exactly the listener `id` from `event_name` on `surface`.
    pub fn unbind(&mut self, surface: EntityId, event_name: &str, id: ListenerId) -> Result<()> {
        if self.dispatcher_mut(surface)?.unbind(event_name, id) {
            Ok(())
        } else {
            Err(EngineError::ListenerNotBound {
                surface,
                event_name: event_name.to_string(),
                listener: id.0,
            })
        }
    }

    /// Number of listeners on `surface` for `event_name` (0 if not in play).
    #[must_use]
    pub fn listener_count(&self, surface: EntityId, event_name: &str) -> usize {
        self.dispatcher(surface)
            .map_or(0, |d| d.listener_count(event_name))
    }

    /// Notify every listener of `event_name` on `surface`, in bind order.
    ///
    /// The listener list is snapshotted first. A listener unbound by an
    /// earlier one in the same pass does not run. Errors from listeners
    /// propagate immediately.
    pub fn fire(&mut self, surface: EntityId, event_name: &str, args: &EventArgs) -> Result<()> {
        if self
            .dispatching
            .iter()
            .any(|(s, name)| *s == surface && name == event_name)
        {
            return Err(EngineError::ReentrantDispatch {
                surface,
                event_name: event_name.to_string(),
            });
        }
        if self.dispatching.len() >= self.config.max_dispatch_depth {
            return Err(EngineError::DispatchDepthExceeded(self.config.max_dispatch_depth));
        }

        let listeners = self.dispatcher(surface)?.snapshot(event_name);
        if listeners.is_empty() {
            return Ok(());
        }
        trace!(%surface, event_name, listeners = listeners.len(), "firing");

        self.dispatching.push((surface, event_name.to_string()));
        let result = self.run_listeners(surface, event_name, &listeners, args);
        self.dispatching.pop();
        result
    }

    fn run_listeners(
        &mut self,
        surface: EntityId,
        event_name: &str,
        listeners: &ListenerList,
        args: &EventArgs,
    ) -> Result<()> {
        for (id, listener) in listeners {
            let bound = self
                .dispatcher(surface)
                .is_ok_and(|d| d.is_bound(event_name, *id));
            if !bound {
                trace!(%surface, event_name, listener = id.0, "skipping unbound listener");
                continue;
            }
            listener(self, args)?;
        }
        Ok(())
    }

    // === Effects ===

    /// Activate `effect` for `owner` and keep it attached to that entity.
    pub fn attach_effect(&mut self, owner: EntityId, mut effect: Effect) -> Result<()> {
        if !self.contains(owner) {
            return Err(EngineError::UnknownEntity(owner));
        }
        effect.apply(self, owner)?;

        match owner.as_player(self.player_count()) {
            Some(player) => self.players[player].effects.push(effect),
            None => match self.minions.get_mut(&owner) {
                Some(minion) => minion.effects.push(effect),
                None => {
                    // The owner left play while its effect was being bound.
                    effect.unapply(self)?;
                    return Err(EngineError::UnknownEntity(owner));
                }
            },
        }
        Ok(())
    }

    /// Unapply and drop every effect attached to `owner`.
    pub fn detach_effects(&mut self, owner: EntityId) -> Result<usize> {
        let effects = match owner.as_player(self.player_count()) {
            Some(player) => self.players.get_mut(player).map(|p| std::mem::take(&mut p.effects)),
            None => self.minions.get_mut(&owner).map(|m| std::mem::take(&mut m.effects)),
        }
        .ok_or(EngineError::UnknownEntity(owner))?;

        let count = effects.len();
        for mut effect in effects {
            effect.unapply(self)?;
        }
        Ok(count)
    }

    /// Number of effects attached to `owner`.
    #[must_use]
    pub fn effect_count(&self, owner: EntityId) -> usize {
        match owner.as_player(self.player_count()) {
            Some(player) => self.players.get(player).map_or(0, |p| p.effects.len()),
            None => self.minions.get(&owner).map_or(0, Minion::effect_count),
        }
    }

    // === Auras ===

    /// Apply `aura` on behalf of `owner` and register it with `holder`.
    pub fn add_aura(&mut self, holder: PlayerId, owner: EntityId, mut aura: Box<dyn Aura>) -> Result<AuraId> {
        if self.players.get(holder).is_none() {
            return Err(EngineError::NotAPlayer(EntityId::player(holder)));
        }
        if !self.contains(owner) {
            return Err(EngineError::UnknownEntity(owner));
        }

        let id = AuraId(self.next_aura_id);
        self.next_aura_id += 1;
        let slot = AuraSlot { id, owner, holder };

        aura.apply(self, slot)?;
        self.auras.insert(id, ActiveAura { slot, aura });
        self.players[holder].auras.push(id);
        debug!(aura = %id, %holder, %owner, "aura registered");
        Ok(id)
    }

    /// Apply an aura owned by `player`'s hero.
    pub fn add_player_aura(&mut self, player: PlayerId, aura: Box<dyn Aura>) -> Result<AuraId> {
        self.add_aura(player, EntityId::player(player), aura)
    }

    /// Deregister an aura and reverse it.
    pub fn remove_aura(&mut self, id: AuraId) -> Result<()> {
        let ActiveAura { slot, mut aura } = self
            .auras
            .remove(&id)
            .ok_or(EngineError::AuraNotActive(id.0))?;

        if let Some(player) = self.players.get_mut(slot.holder) {
            player.auras.retain(|a| *a != id);
        }
        debug!(aura = %id, holder = %slot.holder, "aura deregistered");
        aura.unapply(self)
    }

    #[must_use]
    pub fn is_aura_active(&self, id: AuraId) -> bool {
        self.auras.contains_key(&id)
    }

    /// Active auras held by `player`, oldest first.
    #[must_use]
    pub fn player_auras(&self, player: PlayerId) -> &[AuraId] {
        self.players.get(player).map(PlayerState::auras).unwrap_or(&[])
    }

    /// Reapply every board-tracking aura so it matches the current board.
    pub fn refresh_auras(&mut self) -> Result<()> {
        let ids: Vec<AuraId> = self
            .players
            .iter()
            .flat_map(|(_, p)| p.auras.iter().copied())
            .collect();

        for id in ids {
            let Some(mut active) = self.auras.remove(&id) else {
                continue;
            };
            let result = if active.aura.tracks_board() {
                active
                    .aura
                    .unapply(self)
                    .and_then(|()| active.aura.apply(self, active.slot))
            } else {
                Ok(())
            };
            self.auras.insert(id, active);
            result?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("config", &self.config)
            .field("active_player", &self.active_player)
            .field("turn_number", &self.turn_number)
            .field("minions", &self.minions.len())
            .field("auras", &self.auras.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn game() -> Game {
        Game::new(GameConfig::new(2))
    }

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Listener {
        let log = Rc::clone(log);
        Rc::new(move |_, _| {
            log.borrow_mut().push(tag);
            Ok(())
        })
    }

    #[test]
    fn test_new_game_heroes() {
        let game = game();
        assert_eq!(game.stat(EntityId(0), stat::HEALTH), Some(30));
        assert_eq!(game.stat(EntityId(1), stat::MAX_HEALTH), Some(30));
        assert_eq!(game.stat(EntityId(2), stat::HEALTH), None);
    }

    #[test]
    fn test_summon_order_and_position() {
        let mut game = game();
        let p0 = PlayerId::new(0);
        let a = game.summon(p0, "A", 1, 1).unwrap();
        let b = game.summon(p0, "B", 1, 1).unwrap();
        let c = game.summon_at(p0, Some(0), "C", 1, 1).unwrap();

        let board: Vec<_> = game.player_minions(p0).into_iter().collect();
        assert_eq!(board, vec![c, a, b]);
        assert_eq!(game.controller_of(b), Some(p0));
        assert!(game.player_minions(PlayerId::new(1)).is_empty());
    }

    #[test]
    fn test_summon_unknown_player() {
        let mut game = game();
        let err = game.summon(PlayerId::new(5), "X", 1, 1).unwrap_err();
        assert!(matches!(err, EngineError::NotAPlayer(_)));
    }

    #[test]
    fn test_modify_stat_unknown_entity() {
        let mut game = game();
        let err = game.modify_stat(EntityId(99), stat::ATTACK, 1).unwrap_err();
        assert!(matches!(err, EngineError::UnknownEntity(EntityId(99))));
    }

    #[test]
    fn test_stat_overflow_leaves_stat() {
        let mut game = game();
        let hero = EntityId(0);
        let err = game.modify_stat(hero, stat::HEALTH, i64::MAX).unwrap_err();
        assert!(matches!(err, EngineError::StatOverflow { entity: EntityId(0), ref key } if key == stat::HEALTH));
        assert_eq!(game.stat(hero, stat::HEALTH), Some(30));

        assert!(game.reduce_stat(hero, stat::ATTACK, i64::MIN).is_err());
        assert_eq!(game.reduce_stat(hero, stat::HEALTH, 5).unwrap(), 25);
        assert!(game.deal_damage(None, hero, i64::MIN).is_err());
        assert_eq!(game.stat(hero, stat::HEALTH), Some(25));
    }

    #[test]
    fn test_fire_in_bind_order() {
        let mut game = game();
        let hero = EntityId(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        game.bind(hero, "ping", recorder(&log, "first")).unwrap();
        game.bind(hero, "ping", recorder(&log, "second")).unwrap();

        game.fire(hero, "ping", &EventArgs::new()).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_listener_unbound_mid_dispatch_does_not_run() {
        let mut game = game();
        let hero = EntityId(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let victim_id = Rc::new(RefCell::new(None::<ListenerId>));
        let victim_ref = Rc::clone(&victim_id);
        game.bind(hero, "ping", Rc::new(move |game: &mut Game, _: &EventArgs| {
            if let Some(id) = victim_ref.borrow_mut().take() {
                game.unbind(EntityId(0), "ping", id)?;
            }
            Ok(())
        }))
        .unwrap();
        let id = game.bind(hero, "ping", recorder(&log, "victim")).unwrap();
        *victim_id.borrow_mut() = Some(id);

        game.fire(hero, "ping", &EventArgs::new()).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(game.listener_count(hero, "ping"), 1);
    }

    #[test]
    fn test_reentrant_dispatch_is_reported() {
        let mut game = game();
        let hero = EntityId(0);
        game.bind(hero, "loop", Rc::new(|game: &mut Game, args: &EventArgs| {
            game.fire(EntityId(0), "loop", args)
        }))
        .unwrap();

        let err = game.fire(hero, "loop", &EventArgs::new()).unwrap_err();
        assert!(matches!(err, EngineError::ReentrantDispatch { .. }));

        // the dispatch stack unwinds, so a later firing is not mistaken for re-entry
        let err = game.fire(hero, "loop", &EventArgs::new()).unwrap_err();
        assert!(matches!(err, EngineError::ReentrantDispatch { .. }));
    }

    #[test]
    fn test_dispatch_depth_limit() {
        let mut game = Game::new(GameConfig::new(2).with_max_dispatch_depth(1));
        game.bind(EntityId(0), "outer", Rc::new(|game: &mut Game, args: &EventArgs| {
            game.fire(EntityId(1), "inner", args)
        }))
        .unwrap();
        game.bind(EntityId(1), "inner", Rc::new(|_, _| Ok(()))).unwrap();

        let err = game.fire(EntityId(0), "outer", &EventArgs::new()).unwrap_err();
        assert!(matches!(err, EngineError::DispatchDepthExceeded(1)));
    }

    #[test]
    fn test_unbind_twice_fails() {
        let mut game = game();
        let id = game.bind(EntityId(0), "ping", Rc::new(|_, _| Ok(()))).unwrap();
        game.unbind(EntityId(0), "ping", id).unwrap();
        let err = game.unbind(EntityId(0), "ping", id).unwrap_err();
        assert!(matches!(err, EngineError::ListenerNotBound { .. }));
    }

    #[test]
    fn test_deal_damage_notifies_victim_and_controller() {
        let mut game = game();
        let p1 = PlayerId::new(1);
        let minion = game.summon(p1, "Yeti", 4, 5).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        game.bind(minion, occurrence::DAMAGED, recorder(&log, "minion")).unwrap();
        game.bind(EntityId::player(p1), occurrence::CHARACTER_DAMAGED, recorder(&log, "player"))
            .unwrap();

        game.deal_damage(Some(EntityId(0)), minion, 3).unwrap();

        assert_eq!(game.stat(minion, stat::HEALTH), Some(2));
        assert!(game.minion(minion).unwrap().is_damaged());
        assert_eq!(*log.borrow(), vec!["minion", "player"]);
    }

    #[test]
    fn test_end_turn_rotates() {
        let mut game = game();
        let log = Rc::new(RefCell::new(Vec::new()));
        game.bind(EntityId(0), occurrence::TURN_ENDED, recorder(&log, "p0 ends")).unwrap();
        game.bind(EntityId(1), occurrence::TURN_STARTED, recorder(&log, "p1 starts")).unwrap();

        game.end_turn().unwrap();

        assert_eq!(game.active_player(), PlayerId::new(1));
        assert_eq!(game.turn_number(), 2);
        assert_eq!(*log.borrow(), vec!["p0 ends", "p1 starts"]);
    }

    #[test]
    fn test_remove_minion() {
        let mut game = game();
        let p0 = PlayerId::new(0);
        let a = game.summon(p0, "A", 1, 1).unwrap();
        let b = game.summon(p0, "B", 1, 1).unwrap();

        let removed = game.remove_minion(a).unwrap();
        assert_eq!(removed.name, "A");
        assert!(!game.contains(a));
        assert_eq!(game.player_minions(p0).into_iter().collect::<Vec<_>>(), vec![b]);
        assert!(matches!(game.remove_minion(a), Err(EngineError::UnknownEntity(_))));
    }
}
