//! # hearth-rules
//!
//! A reversible, event-driven effect engine for turn-based card games.
//!
//! Rules read as "when X happens, if C holds, do A to a chosen target, and
//! be able to undo A later". They are declared from small parts, bound to
//! occurrences on a live board, executed, and saved to or loaded from JSON.
//!
//! ## Design Principles
//!
//! 1. **Reversible by construction**: continuous effects (auras) only accept
//!    actions with an exact inverse, so removing one restores the board.
//!
//! 2. **Immutable definitions, explicit activations**: an `Event` never
//!    changes once built. Binding returns a `Binding` handle and releasing
//!    the subscription consumes it.
//!
//! 3. **One composition root**: deserialization goes through a `Registry`
//!    built at startup. Unknown discriminants are typed errors.
//!
//! ## Architecture
//!
//! - **Single-threaded**: rule parts are shared through `Rc`; listeners are
//!   `Rc<dyn Fn(&mut Game, &EventArgs)>` closures.
//!
//! - **Persistent board snapshots**: boards are `im::Vector`s, so actions
//!   can iterate an O(1) snapshot while mutating the board.
//!
//! - **Stat Values**: all entity state is `i64`, keyed by name.
//!
//! ## Modules
//!
//! - `core`: entity ids, players, configuration, the reference `Game`
//! - `triggers`: dispatch surfaces, events, conditions
//! - `effects`: actions, selectors, targetings, effects, auras
//! - `serialization`: tagged records and the `Registry`
//! - `error`: `EngineError` and `Result`

pub mod core;
pub mod effects;
pub mod error;
pub mod serialization;
pub mod triggers;

// Re-export commonly used types
pub use crate::core::{EntityId, Game, GameConfig, PlayerId, PlayerMap};

pub use crate::effects::{
    Action, Aura, AuraId, AuraRemoval, Effect, MinionAura, PlayerAura, PlayerScope, ReversibleAction, Selector,
    Targeting,
};

pub use crate::error::{EngineError, Family, Result};

pub use crate::serialization::Registry;

pub use crate::triggers::{Binding, Condition, Event, EventArgs, EventScope, Listener};
