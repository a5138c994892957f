//! Effects: one event, one action, one targeting.
//!
//! An effect is the triggered-ability assembly. While active it listens on
//! its event for its owner; each accepted occurrence resolves a target and
//! runs the action on it.
//!
//! ## Lifecycle
//!
//! `new` → [`Effect::apply`] → zero or more firings → [`Effect::unapply`].
//! The effect can be applied again afterwards. It never fires while
//! inactive.

use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::core::{EntityId, Game};
use crate::error::{EngineError, Result};
use crate::triggers::{Binding, Event, EventArgs, Listener};

use super::action::Action;
use super::targeting::Targeting;

#[derive(Debug)]
pub struct Effect {
    event: Event,
    action: Rc<dyn Action>,
    targeting: Rc<dyn Targeting>,
    /// Owner and subscription while active.
    active: Option<(EntityId, Binding)>,
}

impl Effect {
    pub fn new(event: Event, action: impl Action + 'static, targeting: impl Targeting + 'static) -> Self {
        Self::from_parts(event, Rc::new(action), Rc::new(targeting))
    }

    /// Assemble from already shared parts.
    pub fn from_parts(event: Event, action: Rc<dyn Action>, targeting: Rc<dyn Targeting>) -> Self {
        Self {
            event,
            action,
            targeting,
            active: None,
        }
    }

    #[must_use]
    pub fn event(&self) -> &Event {
        &self.event
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The owner this effect was applied for, while active.
    #[must_use]
    pub fn owner(&self) -> Option<EntityId> {
        self.active.as_ref().map(|(owner, _)| *owner)
    }

    /// Start listening on behalf of `owner`.
    pub fn apply(&mut self, game: &mut Game, owner: EntityId) -> Result<()> {
        if self.active.is_some() {
            return Err(EngineError::AlreadyActive("effect"));
        }

        let action = Rc::clone(&self.action);
        let targeting = Rc::clone(&self.targeting);
        let callback: Listener = Rc::new(move |game: &mut Game, args: &EventArgs| {
            match targeting.select_target(game, owner, args.focus, args.other) {
                Some(target) => action.act(game, target),
                None => {
                    trace!(%owner, ?args, "no target, skipping");
                    Ok(())
                }
            }
        });

        let binding = self.event.bind(game, owner, callback)?;
        debug!(event = self.event.name(), %owner, "effect applied");
        self.active = Some((owner, binding));
        Ok(())
    }

    /// Stop listening.
    pub fn unapply(&mut self, game: &mut Game) -> Result<()> {
        let (owner, binding) = self.active.take().ok_or(EngineError::NotActive("effect"))?;
        self.event.unbind(game, binding)?;
        debug!(event = self.event.name(), %owner, "effect unapplied");
        Ok(())
    }

    /// Serialize to `{ event, action, targeting }`.
    pub fn to_record(&self) -> Result<Value> {
        let mut record = Map::new();
        record.insert("event".to_string(), self.event.to_record()?);
        record.insert("action".to_string(), self.action.to_record()?);
        record.insert("targeting".to_string(), self.targeting.to_record()?);
        Ok(Value::Object(record))
    }
}
