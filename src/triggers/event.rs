//! Events: named occurrences a rule can subscribe to.
//!
//! An [`Event`] is an immutable definition: an occurrence name, the scope
//! that decides which dispatch surface it subscribes on, and an optional
//! [`Condition`] gate. Binding it returns a [`Binding`] handle that holds the
//! transient subscription state; releasing the subscription consumes that
//! handle. The same `Event` can therefore back any number of simultaneous
//! activations without them sharing state.
//!
//! ## Scopes
//!
//! - [`EventScope::Minion`]: subscribes on the bound entity itself
//! - [`EventScope::Player`]: subscribes on the player controlling the entity
//!
//! Condition gating is identical for both. The scope is part of an event's
//! record, so a rebuilt event subscribes on the same surface.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::{EntityId, Game};
use crate::error::{EngineError, Result};

use super::condition::Condition;
use super::dispatch::{Listener, ListenerId};

/// Payload of one occurrence.
///
/// - `focus`: the entity the occurrence is about (the damaged minion,
///   the hero whose turn ended, ...)
/// - `other`: a second participant, such as the damage source
/// - `amount`: a numeric value, such as the damage dealt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventArgs {
    pub focus: Option<EntityId>,
    pub other: Option<EntityId>,
    pub amount: Option<i64>,
}

impl EventArgs {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the focus entity (builder pattern).
    #[must_use]
    pub fn with_focus(mut self, focus: EntityId) -> Self {
        self.focus = Some(focus);
        self
    }

    /// Set the other participant (builder pattern).
    #[must_use]
    pub fn with_other(mut self, other: EntityId) -> Self {
        self.other = Some(other);
        self
    }

    /// Set the amount (builder pattern).
    #[must_use]
    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Which dispatch surface an event subscribes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    /// The bound entity's own surface.
    Minion,
    /// The surface of the player controlling the bound entity.
    Player,
}

/// A live subscription created by [`Event::bind`].
///
/// Not `Clone`: a subscription is released exactly once by passing the
/// handle back to [`Event::unbind`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a binding leaks the subscription"]
pub struct Binding {
    target: EntityId,
    surface: EntityId,
    event_name: String,
    listener: ListenerId,
}

impl Binding {
    /// The entity the event was bound for.
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// The entity whose dispatcher holds the listener.
    pub fn surface(&self) -> EntityId {
        self.surface
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }
}

/// A named occurrence with an optional condition gate.
#[derive(Clone, Debug)]
pub struct Event {
    name: String,
    scope: EventScope,
    condition: Option<Rc<dyn Condition>>,
}

impl Event {
    /// Create an event of the given scope.
    pub fn new(name: impl Into<String>, scope: EventScope) -> Self {
        Self {
            name: name.into(),
            scope,
            condition: None,
        }
    }

    /// An event fired on the bound entity itself.
    pub fn minion(name: impl Into<String>) -> Self {
        Self::new(name, EventScope::Minion)
    }

    /// An event fired on the bound entity's controlling player.
    pub fn player(name: impl Into<String>) -> Self {
        Self::new(name, EventScope::Player)
    }

    /// Gate the event on a condition (builder pattern).
    #[must_use]
    pub fn with_condition(self, condition: impl Condition + 'static) -> Self {
        self.with_shared_condition(Rc::new(condition))
    }

    /// Gate the event on an already shared condition (builder pattern).
    #[must_use]
    pub fn with_shared_condition(mut self, condition: Rc<dyn Condition>) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn scope(&self) -> EventScope {
        self.scope
    }

    #[must_use]
    pub fn condition(&self) -> Option<&Rc<dyn Condition>> {
        self.condition.as_ref()
    }

    /// Resolve the surface this event subscribes on for `target`.
    pub fn surface(&self, game: &Game, target: EntityId) -> Result<EntityId> {
        match self.scope {
            EventScope::Minion if game.contains(target) => Ok(target),
            EventScope::Minion => Err(EngineError::UnknownEntity(target)),
            EventScope::Player => game
                .controller_of(target)
                .map(EntityId::player)
                .ok_or(EngineError::UnknownEntity(target)),
        }
    }

    /// Subscribe `callback` to this event for `target`.
    ///
    /// With a condition, a wrapper capturing `target` and `callback` is
    /// registered instead and forwards only occurrences the condition
    /// accepts. The returned handle identifies exactly that listener.
    pub fn bind(&self, game: &mut Game, target: EntityId, callback: Listener) -> Result<Binding> {
        let surface = self.surface(game, target)?;

        let listener: Listener = match &self.condition {
            Some(condition) => {
                let condition = Rc::clone(condition);
                Rc::new(move |game: &mut Game, args: &EventArgs| {
                    if condition.evaluate(game, target, args) {
                        callback(game, args)
                    } else {
                        Ok(())
                    }
                })
            }
            None => callback,
        };

        let id = game.bind(surface, &self.name, listener)?;
        debug!(event = %self.name, %target, %surface, listener = id.0, "bound");

        Ok(Binding {
            target,
            surface,
            event_name: self.name.clone(),
            listener: id,
        })
    }

    /// Release a subscription created by [`Event::bind`] on this event.
    pub fn unbind(&self, game: &mut Game, binding: Binding) -> Result<()> {
        if binding.event_name != self.name {
            return Err(EngineError::BindingMismatch {
                bound: binding.event_name,
                event_name: self.name.clone(),
            });
        }
        game.unbind(binding.surface, &binding.event_name, binding.listener)?;
        debug!(event = %self.name, target = %binding.target, listener = binding.listener.0, "unbound");
        Ok(())
    }

    /// Serialize to `{ event_name, scope, condition? }`.
    pub fn to_record(&self) -> Result<Value> {
        let mut record = Map::new();
        record.insert("event_name".to_string(), Value::String(self.name.clone()));
        record.insert("scope".to_string(), serde_json::to_value(self.scope)?);
        if let Some(condition) = &self.condition {
            record.insert("condition".to_string(), condition.to_record()?);
        }
        Ok(Value::Object(record))
    }
}
