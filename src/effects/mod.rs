//! Effect system for rule abilities.
//!
//! Rules are assembled from small, stateless parts:
//! - [`Action`] / [`ReversibleAction`]: what happens to a target
//! - [`Targeting`]: which single entity a triggered effect hits
//! - [`Selector`]: which minions a continuous effect covers
//! - [`Effect`]: event + action + targeting, a triggered ability
//! - [`Aura`]: a continuous effect held in a player's aura registry
//!
//! ## Design Philosophy
//!
//! Parts hold parameters only and are shared through `Rc`. Everything that
//! changes over a rule's lifetime (its subscription, the minions an aura
//! touched) lives in the `Effect` or aura instance that was applied, so the
//! same parts can back any number of live rules.
//!
//! Auras accept only reversible actions. Removing an aura undoes exactly
//! what applying it did.

mod action;
mod aura;
mod effect;
mod selector;
mod targeting;

pub use action::{Action, ChangeAttack, ChangeHealth, Damage, Heal, ReversibleAction, Taunt};
pub use aura::{Aura, AuraId, AuraRemoval, AuraSlot, MinionAura, PlayerAura, PlayerScope};
pub use effect::Effect;
pub use selector::{AllMinions, Damaged, HasLowestHealth, HasTaunt, NotSelf, Selector};
pub use targeting::{FocusOrSelf, FocusTarget, OpponentHero, OtherTarget, OwnerHero, SelfTarget, Targeting};
