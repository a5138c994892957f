//! Selectors narrow a candidate board down to the entities a rule covers.
//!
//! Selection is pure: it reads the board, preserves candidate order, and
//! selecting from an already selected set returns that set unchanged.
//!
//! Most selectors judge each candidate alone, and `select` is exactly the
//! candidates `matches` accepts. An aggregate selector judges a candidate
//! against the rest of the candidate set. For those `select` defines
//! membership, and `matches` answers for a candidate selected on its own.

use std::fmt;

use serde_json::Value;

use crate::core::{stat, EntityId, Game};
use crate::error::Result;
use crate::serialization::record;

/// Filter over an ordered candidate sequence.
pub trait Selector: fmt::Debug {
    /// Check one candidate on behalf of `source` (the rule's owner).
    fn matches(&self, game: &Game, source: EntityId, candidate: EntityId) -> bool;

    /// Whether membership depends on the other candidates.
    fn is_aggregate(&self) -> bool {
        false
    }

    /// Keep the matching candidates, in order.
    fn select(&self, game: &Game, source: EntityId, candidates: &[EntityId]) -> Vec<EntityId> {
        candidates
            .iter()
            .copied()
            .filter(|c| self.matches(game, source, *c))
            .collect()
    }

    /// Serialize to a tagged record.
    fn to_record(&self) -> Result<Value>;
}

/// Every minion in play.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllMinions;

impl Selector for AllMinions {
    fn matches(&self, game: &Game, _source: EntityId, candidate: EntityId) -> bool {
        game.is_minion(candidate)
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("minion"))
    }
}

/// Every minion except the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NotSelf;

impl Selector for NotSelf {
    fn matches(&self, game: &Game, source: EntityId, candidate: EntityId) -> bool {
        candidate != source && game.is_minion(candidate)
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("not_self"))
    }
}

/// Minions below their max health.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Damaged;

impl Selector for Damaged {
    fn matches(&self, game: &Game, _source: EntityId, candidate: EntityId) -> bool {
        game.minion(candidate).is_some_and(|m| m.is_damaged())
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("damaged"))
    }
}

/// Minions with taunt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HasTaunt;

impl Selector for HasTaunt {
    fn matches(&self, game: &Game, _source: EntityId, candidate: EntityId) -> bool {
        game.minion(candidate).is_some_and(|m| m.has_taunt())
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("has_taunt"))
    }
}

/// The candidates tied at the lowest health.
///
/// Aggregate over the candidate set: `select` keeps every minion whose
/// health equals the minimum among the candidates. A lone minion is always
/// the lowest, so `matches` accepts any minion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HasLowestHealth;

impl HasLowestHealth {
    fn lowest(game: &Game, candidates: impl IntoIterator<Item = EntityId>) -> Option<i64> {
        candidates
            .into_iter()
            .filter_map(|c| game.minion(c).map(|m| m.stat(stat::HEALTH)))
            .min()
    }
}

impl Selector for HasLowestHealth {
    fn matches(&self, game: &Game, _source: EntityId, candidate: EntityId) -> bool {
        game.is_minion(candidate)
    }

    fn is_aggregate(&self) -> bool {
        true
    }

    fn select(&self, game: &Game, _source: EntityId, candidates: &[EntityId]) -> Vec<EntityId> {
        let Some(lowest) = Self::lowest(game, candidates.iter().copied()) else {
            return Vec::new();
        };
        candidates
            .iter()
            .copied()
            .filter(|c| game.minion(*c).is_some_and(|m| m.stat(stat::HEALTH) == lowest))
            .collect()
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("has_lowest_health"))
    }
}
