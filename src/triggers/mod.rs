//! Event subscription for rules.
//!
//! Rules respond to named occurrences on an entity's dispatch surface.
//! Names are game-defined strings; the engine only routes them.
//!
//! ## Key Components
//!
//! - [`Dispatcher`]: per-entity listener lists, fired in bind order
//! - [`Event`]: an occurrence name, a scope and an optional [`Condition`]
//! - [`Binding`]: the handle returned by `Event::bind`, consumed by `unbind`
//! - [`Condition`]: predicate gating a bound callback
//!
//! ## Example Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use hearth_rules::core::{Game, GameConfig, PlayerId};
//! use hearth_rules::triggers::{Event, IsSelf, Listener};
//!
//! let mut game = Game::new(GameConfig::new(2));
//! let yeti = game.summon(PlayerId::new(0), "Yeti", 4, 5).unwrap();
//! let wisp = game.summon(PlayerId::new(0), "Wisp", 1, 1).unwrap();
//!
//! let hits = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&hits);
//! let callback: Listener = Rc::new(move |_, _| {
//!     counter.set(counter.get() + 1);
//!     Ok(())
//! });
//!
//! // "When this minion's controller sees a character damaged, if it is this minion"
//! let event = Event::player("character_damaged").with_condition(IsSelf);
//! let binding = event.bind(&mut game, yeti, callback).unwrap();
//!
//! game.deal_damage(None, wisp, 1).unwrap();
//! assert_eq!(hits.get(), 0);
//!
//! game.deal_damage(None, yeti, 1).unwrap();
//! assert_eq!(hits.get(), 1);
//!
//! event.unbind(&mut game, binding).unwrap();
//! ```

mod condition;
mod dispatch;
mod event;

pub use condition::{AmountAtLeast, And, Condition, FocusIsFriendly, IsHero, IsMinion, IsSelf, Not, Or};
pub use dispatch::{Dispatcher, Listener, ListenerId, ListenerList};
pub use event::{Binding, Event, EventArgs, EventScope};
