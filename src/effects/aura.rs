//! Auras: continuous effects that hold while registered.
//!
//! An aura applies a [`ReversibleAction`] when it is added to a player's
//! active-aura registry and reverses it when removed.
//!
//! ## State Machine
//!
//! `Inactive → Active → Inactive`. Applying an active aura or unapplying an
//! inactive one is an error, never a silent no-op.
//!
//! ## Kinds
//!
//! - [`MinionAura`]: acts on every minion a [`Selector`] picks from a
//!   player-scoped board. Which minions are reversed on removal follows its
//!   [`AuraRemoval`] policy.
//! - [`PlayerAura`]: acts once on its owner and removes itself the first
//!   time its terminating [`Event`] fires.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use im::Vector;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::{EntityId, Game, PlayerId};
use crate::error::{EngineError, Result};
use crate::triggers::{Binding, Event, EventArgs, Listener};

use super::action::ReversibleAction;
use super::selector::Selector;

/// Identity of one registered aura.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuraId(pub u32);

impl fmt::Display for AuraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aura({})", self.0)
    }
}

/// Where an aura is registered: its id, the entity it acts for and the
/// player whose registry holds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuraSlot {
    pub id: AuraId,
    pub owner: EntityId,
    pub holder: PlayerId,
}

/// A continuous effect. Driven by [`Game::add_aura`] and
/// [`Game::remove_aura`].
pub trait Aura: fmt::Debug {
    fn apply(&mut self, game: &mut Game, slot: AuraSlot) -> Result<()>;

    fn unapply(&mut self, game: &mut Game) -> Result<()>;

    fn is_active(&self) -> bool;

    /// Whether [`Game::refresh_auras`] should reapply this aura.
    fn tracks_board(&self) -> bool {
        false
    }

    /// Serialize the rule configuration. Activation state is not recorded.
    fn to_record(&self) -> Result<Value>;
}

/// Whose boards a [`MinionAura`] covers, relative to its owner's controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerScope {
    #[default]
    Friendly,
    Enemy,
    All,
}

impl PlayerScope {
    /// The covered minions, board by board in turn order.
    pub fn minions(self, game: &Game, owner: EntityId) -> Result<Vector<EntityId>> {
        let controller = game.controller_of(owner).ok_or(EngineError::UnknownEntity(owner))?;
        let mut minions = Vector::new();
        for player in PlayerId::all(game.player_count()) {
            let covered = match self {
                PlayerScope::Friendly => player == controller,
                PlayerScope::Enemy => player != controller,
                PlayerScope::All => true,
            };
            if covered {
                minions.append(game.player_minions(player));
            }
        }
        Ok(minions)
    }
}

/// Which minions a [`MinionAura`] reverses on removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuraRemoval {
    /// The minions matched at apply time that are still in play.
    #[default]
    Snapshot,
    /// The minions the selector matches at removal time.
    Recompute,
}

/// Applies a reversible action to every selected minion on a scoped board.
#[derive(Debug)]
pub struct MinionAura {
    action: Rc<dyn ReversibleAction>,
    selector: Rc<dyn Selector>,
    players: PlayerScope,
    removal: AuraRemoval,
    slot: Option<AuraSlot>,
    affected: Vec<EntityId>,
}

impl MinionAura {
    pub fn new(action: impl ReversibleAction + 'static, selector: impl Selector + 'static) -> Self {
        Self::from_parts(Rc::new(action), Rc::new(selector))
    }

    /// Assemble from already shared parts.
    pub fn from_parts(action: Rc<dyn ReversibleAction>, selector: Rc<dyn Selector>) -> Self {
        Self {
            action,
            selector,
            players: PlayerScope::default(),
            removal: AuraRemoval::default(),
            slot: None,
            affected: Vec::new(),
        }
    }

    /// Set the covered boards (builder pattern).
    #[must_use]
    pub fn with_players(mut self, players: PlayerScope) -> Self {
        self.players = players;
        self
    }

    /// Set the removal policy (builder pattern).
    #[must_use]
    pub fn with_removal(mut self, removal: AuraRemoval) -> Self {
        self.removal = removal;
        self
    }

    #[must_use]
    pub fn players(&self) -> PlayerScope {
        self.players
    }

    #[must_use]
    pub fn removal(&self) -> AuraRemoval {
        self.removal
    }

    /// Minions acted on at the last apply, in board order.
    #[must_use]
    pub fn affected(&self) -> &[EntityId] {
        &self.affected
    }

    fn matched(&self, game: &Game, owner: EntityId) -> Result<Vec<EntityId>> {
        let candidates: Vec<EntityId> = self.players.minions(game, owner)?.into_iter().collect();
        Ok(self.selector.select(game, owner, &candidates))
    }
}

impl Aura for MinionAura {
    fn apply(&mut self, game: &mut Game, slot: AuraSlot) -> Result<()> {
        if self.slot.is_some() {
            return Err(EngineError::AlreadyActive("minion aura"));
        }

        self.affected.clear();
        let matched = self.matched(game, slot.owner)?;
        for minion in matched {
            if let Err(err) = self.action.act(game, minion) {
                for done in self.affected.drain(..).rev() {
                    self.action.unact(game, done)?;
                }
                return Err(err);
            }
            self.affected.push(minion);
        }
        debug!(aura = %slot.id, owner = %slot.owner, affected = self.affected.len(), "minion aura applied");
        self.slot = Some(slot);
        Ok(())
    }

    fn unapply(&mut self, game: &mut Game) -> Result<()> {
        let slot = self.slot.take().ok_or(EngineError::NotActive("minion aura"))?;

        let snapshot = std::mem::take(&mut self.affected);
        let targets = match self.removal {
            AuraRemoval::Snapshot => snapshot,
            AuraRemoval::Recompute if game.contains(slot.owner) => self.matched(game, slot.owner)?,
            // The owner has left play, so there is no board to recompute against.
            AuraRemoval::Recompute => snapshot,
        };

        for minion in targets {
            if !game.is_minion(minion) {
                warn!(aura = %slot.id, %minion, "minion left play, skipping removal");
                continue;
            }
            self.action.unact(game, minion)?;
        }
        debug!(aura = %slot.id, owner = %slot.owner, "minion aura unapplied");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.slot.is_some()
    }

    fn tracks_board(&self) -> bool {
        true
    }

    fn to_record(&self) -> Result<Value> {
        let mut record = Map::new();
        record.insert("action".to_string(), self.action.to_record()?);
        record.insert("selector".to_string(), self.selector.to_record()?);
        record.insert("players".to_string(), serde_json::to_value(self.players)?);
        record.insert("removal".to_string(), serde_json::to_value(self.removal)?);
        Ok(Value::Object(record))
    }
}

#[derive(Debug)]
struct PlayerActivation {
    slot: AuraSlot,
    binding: Binding,
}

/// Applies a reversible action to its owner until an event fires.
#[derive(Debug)]
pub struct PlayerAura {
    action: Rc<dyn ReversibleAction>,
    until: Event,
    active: Option<PlayerActivation>,
}

impl PlayerAura {
    pub fn new(action: impl ReversibleAction + 'static, until: Event) -> Self {
        Self::from_parts(Rc::new(action), until)
    }

    /// Assemble from an already shared action.
    pub fn from_parts(action: Rc<dyn ReversibleAction>, until: Event) -> Self {
        Self {
            action,
            until,
            active: None,
        }
    }

    /// The terminating event.
    #[must_use]
    pub fn until(&self) -> &Event {
        &self.until
    }
}

impl Aura for PlayerAura {
    fn apply(&mut self, game: &mut Game, slot: AuraSlot) -> Result<()> {
        if self.active.is_some() {
            return Err(EngineError::AlreadyActive("player aura"));
        }

        self.action.act(game, slot.owner)?;

        let fired = Rc::new(Cell::new(false));
        let aura_id = slot.id;
        let terminate: Listener = Rc::new(move |game: &mut Game, _: &EventArgs| {
            if fired.replace(true) {
                return Ok(());
            }
            game.remove_aura(aura_id)
        });

        let binding = match self.until.bind(game, slot.owner, terminate) {
            Ok(binding) => binding,
            Err(err) => {
                self.action.unact(game, slot.owner)?;
                return Err(err);
            }
        };
        debug!(aura = %slot.id, owner = %slot.owner, until = self.until.name(), "player aura applied");
        self.active = Some(PlayerActivation { slot, binding });
        Ok(())
    }

    fn unapply(&mut self, game: &mut Game) -> Result<()> {
        let PlayerActivation { slot, binding } = self.active.take().ok_or(EngineError::NotActive("player aura"))?;
        self.action.unact(game, slot.owner)?;
        self.until.unbind(game, binding)?;
        debug!(aura = %slot.id, owner = %slot.owner, "player aura unapplied");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn to_record(&self) -> Result<Value> {
        let mut record = Map::new();
        record.insert("action".to_string(), self.action.to_record()?);
        record.insert("until".to_string(), self.until.to_record()?);
        Ok(Value::Object(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{occurrence, stat, GameConfig};
    use crate::effects::{AllMinions, ChangeAttack, NotSelf, Taunt};

    fn slot(owner: EntityId) -> AuraSlot {
        AuraSlot {
            id: AuraId(0),
            owner,
            holder: PlayerId::new(0),
        }
    }

    #[test]
    fn test_player_scope() {
        let mut game = Game::new(GameConfig::new(2));
        let a = game.summon(PlayerId::new(0), "A", 1, 1).unwrap();
        let b = game.summon(PlayerId::new(1), "B", 1, 1).unwrap();
        let c = game.summon(PlayerId::new(0), "C", 1, 1).unwrap();

        let collect = |scope: PlayerScope| -> Vec<EntityId> {
            scope.minions(&game, a).unwrap().into_iter().collect()
        };
        assert_eq!(collect(PlayerScope::Friendly), vec![a, c]);
        assert_eq!(collect(PlayerScope::Enemy), vec![b]);
        assert_eq!(collect(PlayerScope::All), vec![a, c, b]);
        assert!(PlayerScope::All.minions(&game, EntityId(90)).is_err());
    }

    #[test]
    fn test_minion_aura_state_machine() {
        let mut game = Game::new(GameConfig::new(2));
        let leader = game.summon(PlayerId::new(0), "Leader", 2, 2).unwrap();
        let grunt = game.summon(PlayerId::new(0), "Grunt", 1, 1).unwrap();
        let mut aura = MinionAura::new(ChangeAttack { amount: 1 }, NotSelf);

        aura.apply(&mut game, slot(leader)).unwrap();
        assert!(aura.is_active());
        assert_eq!(aura.affected(), &[grunt]);
        assert_eq!(game.stat(grunt, stat::ATTACK), Some(2));
        assert_eq!(game.stat(leader, stat::ATTACK), Some(2));
        assert!(matches!(
            aura.apply(&mut game, slot(leader)),
            Err(EngineError::AlreadyActive(_))
        ));

        aura.unapply(&mut game).unwrap();
        assert_eq!(game.stat(grunt, stat::ATTACK), Some(1));
        assert!(matches!(aura.unapply(&mut game), Err(EngineError::NotActive(_))));
    }

    #[test]
    fn test_snapshot_removal_skips_departed() {
        let mut game = Game::new(GameConfig::new(2));
        let owner = game.summon(PlayerId::new(0), "Owner", 1, 1).unwrap();
        let leaving = game.summon(PlayerId::new(0), "Leaving", 1, 1).unwrap();
        let mut aura = MinionAura::new(Taunt, AllMinions);

        aura.apply(&mut game, slot(owner)).unwrap();
        game.remove_minion(leaving).unwrap();
        let late = game.summon(PlayerId::new(0), "Late", 1, 1).unwrap();

        aura.unapply(&mut game).unwrap();
        assert_eq!(game.stat(owner, stat::TAUNT), Some(0));
        assert_eq!(game.stat(late, stat::TAUNT), Some(0));
    }

    #[test]
    fn test_recompute_removal() {
        let mut game = Game::new(GameConfig::new(2));
        let owner = game.summon(PlayerId::new(0), "Owner", 1, 1).unwrap();
        let mut aura = MinionAura::new(ChangeAttack { amount: 2 }, AllMinions).with_removal(AuraRemoval::Recompute);

        aura.apply(&mut game, slot(owner)).unwrap();
        let late = game.summon(PlayerId::new(0), "Late", 3, 1).unwrap();
        aura.unapply(&mut game).unwrap();

        assert_eq!(game.stat(owner, stat::ATTACK), Some(1));
        assert_eq!(game.stat(late, stat::ATTACK), Some(1));
    }

    #[test]
    fn test_failed_apply_rolls_back() {
        let mut game = Game::new(GameConfig::new(2));
        let owner = game.summon(PlayerId::new(0), "Owner", 1, 1).unwrap();
        let strong = game.summon(PlayerId::new(0), "Strong", 1, 1).unwrap();
        game.set_stat(strong, stat::ATTACK, i64::MAX - 2).unwrap();
        let mut aura = MinionAura::new(ChangeAttack { amount: 5 }, AllMinions);

        let err = aura.apply(&mut game, slot(owner)).unwrap_err();
        assert!(matches!(err, EngineError::StatOverflow { .. }));
        assert!(!aura.is_active());
        assert!(aura.affected().is_empty());
        assert_eq!(game.stat(owner, stat::ATTACK), Some(1));
        assert_eq!(game.stat(strong, stat::ATTACK), Some(i64::MAX - 2));
    }

    #[test]
    fn test_player_aura_runs_until_event() {
        let mut game = Game::new(GameConfig::new(2));
        let hero = EntityId(0);
        let mut aura = PlayerAura::new(ChangeAttack { amount: 2 }, Event::player(occurrence::TURN_ENDED));

        aura.apply(&mut game, slot(hero)).unwrap();
        assert_eq!(game.stat(hero, stat::ATTACK), Some(2));
        assert_eq!(game.listener_count(hero, occurrence::TURN_ENDED), 1);

        aura.unapply(&mut game).unwrap();
        assert_eq!(game.stat(hero, stat::ATTACK), Some(0));
        assert_eq!(game.listener_count(hero, occurrence::TURN_ENDED), 0);
    }

    #[test]
    fn test_player_aura_bind_failure_reverts_action() {
        let mut game = Game::new(GameConfig::new(2));
        let mut aura = PlayerAura::new(ChangeAttack { amount: 2 }, Event::minion("gone"));
        let err = aura.apply(&mut game, slot(EntityId(20))).unwrap_err();
        assert!(matches!(err, EngineError::UnknownEntity(EntityId(20))));
        assert!(!aura.is_active());
    }

    #[test]
    fn test_records() {
        let aura = MinionAura::new(Taunt, AllMinions).with_players(PlayerScope::Enemy);
        assert_eq!(
            aura.to_record().unwrap(),
            serde_json::json!({
                "action": {"type": "taunt"},
                "selector": {"type": "minion"},
                "players": "enemy",
                "removal": "snapshot",
            })
        );

        let aura = PlayerAura::new(ChangeAttack { amount: 2 }, Event::player(occurrence::TURN_ENDED));
        assert_eq!(
            aura.to_record().unwrap(),
            serde_json::json!({
                "action": {"type": "change_attack", "amount": 2},
                "until": {"event_name": "turn_ended", "scope": "player"},
            })
        );
    }
}
