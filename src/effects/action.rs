//! Actions: the mutations rules perform.
//!
//! An action carries its parameters and nothing else. It holds no state
//! between firings, so one `Rc<dyn Action>` can back any number of rules.
//!
//! ## Reversibility
//!
//! [`ReversibleAction::unact`] is the exact inverse of `act`: for any board
//! state the action may legally touch, `act` followed by `unact` on the same
//! target leaves every stat as it was. Auras rely on this to remove
//! themselves cleanly, so only reversible actions may back an aura.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{stat, EntityId, Game};
use crate::error::{Family, Result};
use crate::serialization::record;

/// A mutation applied to one target.
pub trait Action: fmt::Debug {
    fn act(&self, game: &mut Game, target: EntityId) -> Result<()>;

    /// Serialize to a tagged record.
    fn to_record(&self) -> Result<Value>;
}

/// An action with an exact inverse.
pub trait ReversibleAction: Action {
    fn unact(&self, game: &mut Game, target: EntityId) -> Result<()>;
}

// === Reversible ===

/// Add `amount` to attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeAttack {
    pub amount: i64,
}

impl Action for ChangeAttack {
    fn act(&self, game: &mut Game, target: EntityId) -> Result<()> {
        game.modify_stat(target, stat::ATTACK, self.amount)?;
        Ok(())
    }

    fn to_record(&self) -> Result<Value> {
        record::tagged(Family::Action, "change_attack", self)
    }
}

impl ReversibleAction for ChangeAttack {
    fn unact(&self, game: &mut Game, target: EntityId) -> Result<()> {
        game.reduce_stat(target, stat::ATTACK, self.amount)?;
        Ok(())
    }
}

/// Add `amount` to both health and max health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeHealth {
    pub amount: i64,
}

impl Action for ChangeHealth {
    fn act(&self, game: &mut Game, target: EntityId) -> Result<()> {
        game.modify_stat(target, stat::MAX_HEALTH, self.amount)?;
        if let Err(err) = game.modify_stat(target, stat::HEALTH, self.amount) {
            game.reduce_stat(target, stat::MAX_HEALTH, self.amount)?;
            return Err(err);
        }
        Ok(())
    }

    fn to_record(&self) -> Result<Value> {
        record::tagged(Family::Action, "change_health", self)
    }
}

impl ReversibleAction for ChangeHealth {
    fn unact(&self, game: &mut Game, target: EntityId) -> Result<()> {
        game.reduce_stat(target, stat::MAX_HEALTH, self.amount)?;
        if let Err(err) = game.reduce_stat(target, stat::HEALTH, self.amount) {
            game.modify_stat(target, stat::MAX_HEALTH, self.amount)?;
            return Err(err);
        }
        Ok(())
    }
}

/// Grant taunt. Grants stack; the flag is active while any remain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Taunt;

impl Action for Taunt {
    fn act(&self, game: &mut Game, target: EntityId) -> Result<()> {
        game.modify_stat(target, stat::TAUNT, 1)?;
        Ok(())
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("taunt"))
    }
}

impl ReversibleAction for Taunt {
    fn unact(&self, game: &mut Game, target: EntityId) -> Result<()> {
        game.reduce_stat(target, stat::TAUNT, 1)?;
        Ok(())
    }
}

// === Irreversible ===

/// Deal `amount` damage. Fires the board's damage occurrences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Damage {
    pub amount: i64,
}

impl Action for Damage {
    fn act(&self, game: &mut Game, target: EntityId) -> Result<()> {
        game.deal_damage(None, target, self.amount)
    }

    fn to_record(&self) -> Result<Value> {
        record::tagged(Family::Action, "damage", self)
    }
}

/// Restore up to `amount` health, never above max health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Heal {
    pub amount: i64,
}

impl Action for Heal {
    fn act(&self, game: &mut Game, target: EntityId) -> Result<()> {
        let health = game.stat(target, stat::HEALTH).unwrap_or(0);
        let max_health = game.stat(target, stat::MAX_HEALTH).unwrap_or(0);
        let healed = health.saturating_add(self.amount).min(max_health).max(health);
        game.set_stat(target, stat::HEALTH, healed)
    }

    fn to_record(&self) -> Result<Value> {
        record::tagged(Family::Action, "heal", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameConfig, PlayerId};
    use crate::error::EngineError;

    fn board() -> (Game, EntityId) {
        let mut game = Game::new(GameConfig::new(2));
        let yeti = game.summon(PlayerId::new(0), "Yeti", 4, 5).unwrap();
        (game, yeti)
    }

    #[test]
    fn test_change_attack_reverses() {
        let (mut game, yeti) = board();
        let action = ChangeAttack { amount: 3 };

        action.act(&mut game, yeti).unwrap();
        assert_eq!(game.stat(yeti, stat::ATTACK), Some(7));
        action.unact(&mut game, yeti).unwrap();
        assert_eq!(game.stat(yeti, stat::ATTACK), Some(4));
    }

    #[test]
    fn test_change_health_touches_max() {
        let (mut game, yeti) = board();
        let action = ChangeHealth { amount: 2 };

        action.act(&mut game, yeti).unwrap();
        assert_eq!(game.stat(yeti, stat::HEALTH), Some(7));
        assert_eq!(game.stat(yeti, stat::MAX_HEALTH), Some(7));

        action.unact(&mut game, yeti).unwrap();
        assert_eq!(game.stat(yeti, stat::HEALTH), Some(5));
        assert_eq!(game.stat(yeti, stat::MAX_HEALTH), Some(5));
    }

    #[test]
    fn test_taunt_stacks() {
        let (mut game, yeti) = board();
        Taunt.act(&mut game, yeti).unwrap();
        Taunt.act(&mut game, yeti).unwrap();
        Taunt.unact(&mut game, yeti).unwrap();
        assert!(game.minion(yeti).unwrap().has_taunt());

        Taunt.unact(&mut game, yeti).unwrap();
        assert!(!game.minion(yeti).unwrap().has_taunt());
    }

    #[test]
    fn test_damage_and_heal() {
        let (mut game, yeti) = board();
        Damage { amount: 3 }.act(&mut game, yeti).unwrap();
        assert_eq!(game.stat(yeti, stat::HEALTH), Some(2));

        Heal { amount: 10 }.act(&mut game, yeti).unwrap();
        assert_eq!(game.stat(yeti, stat::HEALTH), Some(5));
    }

    #[test]
    fn test_out_of_range_amounts() {
        let (mut game, yeti) = board();

        let err = ChangeAttack { amount: i64::MAX }.act(&mut game, yeti).unwrap_err();
        assert!(matches!(err, EngineError::StatOverflow { ref key, .. } if key == stat::ATTACK));
        assert_eq!(game.stat(yeti, stat::ATTACK), Some(4));

        assert!(ChangeAttack { amount: i64::MIN }.unact(&mut game, yeti).is_err());
        assert_eq!(game.stat(yeti, stat::ATTACK), Some(4));

        // Max health moves first and is put back when health overflows.
        game.set_stat(yeti, stat::HEALTH, i64::MAX - 1).unwrap();
        assert!(ChangeHealth { amount: 2 }.act(&mut game, yeti).is_err());
        assert_eq!(game.stat(yeti, stat::MAX_HEALTH), Some(5));

        game.set_stat(yeti, stat::HEALTH, 3).unwrap();
        Heal { amount: i64::MAX }.act(&mut game, yeti).unwrap();
        assert_eq!(game.stat(yeti, stat::HEALTH), Some(5));
    }

    #[test]
    fn test_unknown_target() {
        let (mut game, _) = board();
        let err = ChangeAttack { amount: 1 }.act(&mut game, EntityId(77)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownEntity(EntityId(77))));
    }

    #[test]
    fn test_records() {
        assert_eq!(
            ChangeAttack { amount: 2 }.to_record().unwrap(),
            serde_json::json!({"type": "change_attack", "amount": 2})
        );
        assert_eq!(Taunt.to_record().unwrap(), serde_json::json!({"type": "taunt"}));
    }
}
