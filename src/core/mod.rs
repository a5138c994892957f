//! Core board types: entities, players, configuration and the reference board.
//!
//! These are the collaborators rules run against. The rule parts themselves
//! live in `triggers` and `effects`.

pub mod config;
pub mod entity;
pub mod player;
pub mod state;

pub use config::GameConfig;
pub use entity::EntityId;
pub use player::{PlayerId, PlayerMap};
pub use state::{occurrence, stat, Game, Minion, PlayerState, Stats};
