//! Entity identification.
//!
//! Heroes and minions share one id space so rules can target either
//! without knowing which it is.
//!
//! ## ID Layout
//!
//! - `0..player_count`: the players (a player and its hero are one entity)
//! - `player_count..`: minions, allocated by the board as they are summoned
//!
//! ```
//! use hearth_rules::core::{EntityId, PlayerId};
//!
//! let hero = EntityId::player(PlayerId::new(1));
//! assert!(hero.is_player(2));
//! assert_eq!(hero.as_player(2), Some(PlayerId::new(1)));
//!
//! let minion = EntityId(7);
//! assert!(!minion.is_player(2));
//! ```

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Unique identifier for a hero or a minion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Entity of the given player's hero.
    #[must_use]
    pub const fn player(id: PlayerId) -> Self {
        Self(id.0 as u32)
    }

    /// First id handed out to minions in a game with `player_count` players.
    #[must_use]
    pub const fn first_minion(player_count: usize) -> u32 {
        player_count as u32
    }

    /// Check if this entity is one of the players.
    #[must_use]
    pub const fn is_player(self, player_count: usize) -> bool {
        self.0 < player_count as u32
    }

    /// Convert to a `PlayerId` if this entity is a player.
    #[must_use]
    pub fn as_player(self, player_count: usize) -> Option<PlayerId> {
        if self.is_player(player_count) {
            Some(PlayerId::new(self.0 as u8))
        } else {
            None
        }
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
