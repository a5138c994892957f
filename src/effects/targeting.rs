//! Effect targeting.
//!
//! A targeting resolves exactly one entity from the firing context: the
//! effect's owner, the occurrence focus and the optional other participant.
//! `None` means the effect skips that firing. Entities that are no longer
//! in play never resolve.

use std::fmt;

use serde_json::Value;

use crate::core::{EntityId, Game};
use crate::error::Result;
use crate::serialization::record;

/// Resolver for a single target.
pub trait Targeting: fmt::Debug {
    fn select_target(
        &self,
        game: &Game,
        owner: EntityId,
        focus: Option<EntityId>,
        other: Option<EntityId>,
    ) -> Option<EntityId>;

    /// Serialize to a tagged record.
    fn to_record(&self) -> Result<Value>;
}

fn in_play(game: &Game, entity: Option<EntityId>) -> Option<EntityId> {
    entity.filter(|e| game.contains(*e))
}

/// The effect's owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelfTarget;

impl Targeting for SelfTarget {
    fn select_target(&self, game: &Game, owner: EntityId, _: Option<EntityId>, _: Option<EntityId>) -> Option<EntityId> {
        in_play(game, Some(owner))
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("self"))
    }
}

/// The entity the occurrence is about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusTarget;

impl Targeting for FocusTarget {
    fn select_target(&self, game: &Game, _: EntityId, focus: Option<EntityId>, _: Option<EntityId>) -> Option<EntityId> {
        in_play(game, focus)
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("focus"))
    }
}

/// The occurrence's second participant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OtherTarget;

impl Targeting for OtherTarget {
    fn select_target(&self, game: &Game, _: EntityId, _: Option<EntityId>, other: Option<EntityId>) -> Option<EntityId> {
        in_play(game, other)
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("other"))
    }
}

/// The focus if it is in play, else the owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusOrSelf;

impl Targeting for FocusOrSelf {
    fn select_target(&self, game: &Game, owner: EntityId, focus: Option<EntityId>, _: Option<EntityId>) -> Option<EntityId> {
        in_play(game, focus).or_else(|| in_play(game, Some(owner)))
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("focus_or_self"))
    }
}

/// The hero of the owner's controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OwnerHero;

impl Targeting for OwnerHero {
    fn select_target(&self, game: &Game, owner: EntityId, _: Option<EntityId>, _: Option<EntityId>) -> Option<EntityId> {
        game.controller_of(owner).map(EntityId::player)
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("owner_hero"))
    }
}

/// The hero of the player after the owner's controller in turn order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpponentHero;

impl Targeting for OpponentHero {
    fn select_target(&self, game: &Game, owner: EntityId, _: Option<EntityId>, _: Option<EntityId>) -> Option<EntityId> {
        game.controller_of(owner)
            .map(|p| EntityId::player(p.next(game.player_count())))
    }

    fn to_record(&self) -> Result<Value> {
        Ok(record::unit("opponent_hero"))
    }
}
