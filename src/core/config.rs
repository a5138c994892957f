//! Engine configuration.
//!
//! The board is configured once at startup. Rules themselves carry their
//! own parameters and are not affected by these settings.

use serde::{Deserialize, Serialize};

/// Default starting health for every hero.
pub const DEFAULT_HERO_HEALTH: i64 = 30;

/// Default bound on nested event dispatch.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

/// Complete board configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of players (1-255).
    pub player_count: usize,

    /// Starting health (and max health) of each hero.
    #[serde(default = "default_hero_health")]
    pub hero_health: i64,

    /// How deeply event handlers may fire further events before the
    /// dispatcher reports a runaway chain.
    #[serde(default = "default_max_dispatch_depth")]
    pub max_dispatch_depth: usize,
}

fn default_hero_health() -> i64 {
    DEFAULT_HERO_HEALTH
}

fn default_max_dispatch_depth() -> usize {
    DEFAULT_MAX_DISPATCH_DEPTH
}

impl GameConfig {
    /// Create a new configuration.
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            player_count,
            hero_health: DEFAULT_HERO_HEALTH,
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }

    /// Set the starting hero health.
    #[must_use]
    pub fn with_hero_health(mut self, health: i64) -> Self {
        self.hero_health = health;
        self
    }

    /// Set the nested dispatch limit.
    #[must_use]
    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(2)
    }
}
