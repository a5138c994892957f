//! Per-entity dispatch surfaces.
//!
//! Every hero and minion owns a `Dispatcher`. Rules subscribe listeners to
//! named occurrences on it; game code fires those occurrences through
//! [`Game::fire`](crate::core::Game::fire).

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::Game;
use crate::error::Result;

use super::event::EventArgs;

/// A subscribed callback. Receives the board and the occurrence payload.
pub type Listener = Rc<dyn Fn(&mut Game, &EventArgs) -> Result<()>>;

/// Listeners bound to one event name, in bind order.
pub type ListenerList = SmallVec<[(ListenerId, Listener); 4]>;

/// Identity of one bound listener. Unique across the whole board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({})", self.0)
    }
}

/// Named-occurrence subscriptions for a single entity.
#[derive(Default)]
pub struct Dispatcher {
    listeners: FxHashMap<String, ListenerList>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `event_name`.
    pub fn bind(&mut self, event_name: &str, id: ListenerId, listener: Listener) {
        self.listeners
            .entry(event_name.to_string())
            .or_default()
            .push((id, listener));
    }

    /// Remove the listener with `id`. Returns false if it was not bound.
    pub fn unbind(&mut self, event_name: &str, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(event_name) else {
            return false;
        };
        let Some(pos) = list.iter().position(|(lid, _)| *lid == id) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.listeners.remove(event_name);
        }
        true
    }

    /// Check whether `id` is currently bound to `event_name`.
    #[must_use]
    pub fn is_bound(&self, event_name: &str, id: ListenerId) -> bool {
        self.listeners
            .get(event_name)
            .is_some_and(|list| list.iter().any(|(lid, _)| *lid == id))
    }

    /// Copy of the listeners for `event_name`, in bind order.
    #[must_use]
    pub fn snapshot(&self, event_name: &str) -> ListenerList {
        self.listeners.get(event_name).cloned().unwrap_or_default()
    }

    /// Number of listeners bound to `event_name`.
    #[must_use]
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners.get(event_name).map_or(0, |list| list.len())
    }

    /// Total number of listeners across all events.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.listeners.values().map(|list| list.len()).sum()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, list) in &self.listeners {
            let ids: Vec<u64> = list.iter().map(|(id, _)| id.0).collect();
            map.entry(name, &ids);
        }
        map.finish()
    }
}
