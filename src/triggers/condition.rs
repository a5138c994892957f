//! Conditions gate bound events.
//!
//! A condition is a pure predicate over the entity an event was bound for
//! and the occurrence payload. It never mutates the board.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{EntityId, Game};
use crate::error::{Family, Result};
use crate::serialization::record;

use super::event::EventArgs;

/// Predicate deciding whether a bound callback runs for an occurrence.
pub trait Condition: fmt::Debug {
    /// Check the occurrence `args` against the bound `target`.
    fn evaluate(&self, game: &Game, target: EntityId, args: &EventArgs) -> bool;

    /// Serialize to a tagged record.
    fn to_record(&self) -> Result<Value>;
}

/// The occurrence is about the bound entity itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IsSelf;

impl Condition for IsSelf {
    fn evaluate(&self, _game: &Game, target: EntityId, args: &EventArgs) -> bool {
        args.focus == Some(target)
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("is_self"))
    }
}

/// The occurrence is about a minion in play.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IsMinion;

impl Condition for IsMinion {
    fn evaluate(&self, game: &Game, _target: EntityId, args: &EventArgs) -> bool {
        args.focus.is_some_and(|focus| game.is_minion(focus))
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("is_minion"))
    }
}

/// The occurrence is about a hero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IsHero;

impl Condition for IsHero {
    fn evaluate(&self, game: &Game, _target: EntityId, args: &EventArgs) -> bool {
        args.focus.is_some_and(|focus| focus.is_player(game.player_count()))
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("is_hero"))
    }
}

/// The focus is controlled by the same player as the bound entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusIsFriendly;

impl Condition for FocusIsFriendly {
    fn evaluate(&self, game: &Game, target: EntityId, args: &EventArgs) -> bool {
        let Some(focus) = args.focus else {
            return false;
        };
        match (game.controller_of(focus), game.controller_of(target)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("focus_is_friendly"))
    }
}

/// The occurrence carries an amount of at least `min`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmountAtLeast {
    pub min: i64,
}

impl Condition for AmountAtLeast {
    fn evaluate(&self, _game: &Game, _target: EntityId, args: &EventArgs) -> bool {
        args.amount.is_some_and(|amount| amount >= self.min)
    }

    fn to_record(&self) -> Result<Value> {
        record::tagged(Family::Condition, "amount_at_least", self)
    }
}

// === Combinators ===

/// Negates the inner condition.
#[derive(Clone, Debug)]
pub struct Not {
    pub condition: Rc<dyn Condition>,
}

impl Not {
    pub fn new(condition: impl Condition + 'static) -> Self {
        Self {
            condition: Rc::new(condition),
        }
    }
}

impl Condition for Not {
    fn evaluate(&self, game: &Game, target: EntityId, args: &EventArgs) -> bool {
        !self.condition.evaluate(game, target, args)
    }

    fn to_record(&self) -> Result<Value> {
        let mut params = Map::new();
        params.insert("condition".to_string(), self.condition.to_record()?);
        Ok(record::with_params("not", params))
    }
}

/// All inner conditions must hold. Empty is true.
#[derive(Clone, Debug, Default)]
pub struct And {
    pub conditions: Vec<Rc<dyn Condition>>,
}

impl And {
    /// Add a condition (builder pattern).
    #[must_use]
    pub fn with(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Rc::new(condition));
        self
    }
}

impl Condition for And {
    fn evaluate(&self, game: &Game, target: EntityId, args: &EventArgs) -> bool {
        self.conditions.iter().all(|c| c.evaluate(game, target, args))
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::with_params("and", conditions_params(&self.conditions)?))
    }
}

/// At least one inner condition must hold. Empty is false.
#[derive(Clone, Debug, Default)]
pub struct Or {
    pub conditions: Vec<Rc<dyn Condition>>,
}

impl Or {
    /// Add a condition (builder pattern).
    #[must_use]
    pub fn with(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Rc::new(condition));
        self
    }
}

impl Condition for Or {
    fn evaluate(&self, game: &Game, target: EntityId, args: &EventArgs) -> bool {
        self.conditions.iter().any(|c| c.evaluate(game, target, args))
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::with_params("or", conditions_params(&self.conditions)?))
    }
}

fn conditions_params(conditions: &[Rc<dyn Condition>]) -> Result<Map<String, Value>> {
    let records = conditions
        .iter()
        .map(|c| c.to_record())
        .collect::<Result<Vec<_>>>()?;
    let mut params = Map::new();
    params.insert("conditions".to_string(), Value::Array(records));
    Ok(params)
}
