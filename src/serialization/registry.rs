//! Registry of rule part factories.
//!
//! The `Registry` maps a normalized discriminant to a factory for each rule
//! family. It is built once at startup and then only read: deserializing a
//! record looks its discriminant up and hands the remaining parameters to
//! the factory. Nested records (the condition inside an event, the action
//! inside an aura) resolve through the same registry.
//!
//! Lookups are keyed by [`normalize_discriminant`], so `change_attack` and
//! `CHANGE_ATTACK` resolve to the same factory.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::core::occurrence;
use crate::effects::{
    Action, AllMinions, AuraRemoval, ChangeAttack, ChangeHealth, Damage, Damaged, Effect, FocusOrSelf, FocusTarget,
    HasLowestHealth, HasTaunt, Heal, MinionAura, NotSelf, OpponentHero, OtherTarget, OwnerHero, PlayerAura,
    PlayerScope, ReversibleAction, Selector, SelfTarget, Targeting, Taunt,
};
use crate::error::{EngineError, Family, Result};
use crate::triggers::{
    AmountAtLeast, And, Condition, Event, EventScope, FocusIsFriendly, IsHero, IsMinion, IsSelf, Not, Or,
};

use super::record::{self, normalize_discriminant, EVENT_TAG, TYPE_TAG};

type Factory<T> = Box<dyn Fn(&Registry, Map<String, Value>) -> Result<Rc<T>>>;

struct ActionFactories {
    action: Factory<dyn Action>,
    reversible: Option<Factory<dyn ReversibleAction>>,
}

/// Factories for every serializable rule family.
///
/// ## Example
///
/// ```
/// use hearth_rules::serialization::Registry;
///
/// let registry = Registry::standard();
/// let record = serde_json::json!({"type": "change_attack", "amount": 2});
///
/// let action = registry.reversible_action(&record).unwrap();
/// assert_eq!(action.to_record().unwrap(), record);
/// ```
#[derive(Default)]
pub struct Registry {
    actions: FxHashMap<String, ActionFactories>,
    conditions: FxHashMap<String, Factory<dyn Condition>>,
    selectors: FxHashMap<String, Factory<dyn Selector>>,
    targetings: FxHashMap<String, Factory<dyn Targeting>>,
    /// Normalized name → (canonical name, scope).
    events: FxHashMap<String, (String, EventScope)>,
}

/// Factory deserializing the parameters straight into `T`.
fn from_params<T: DeserializeOwned + 'static>(
    family: Family,
    discriminant: &str,
) -> impl Fn(&Registry, Map<String, Value>) -> Result<T> + 'static {
    let discriminant = discriminant.to_string();
    move |_: &Registry, params: Map<String, Value>| {
        serde_json::from_value(Value::Object(params)).map_err(|source| EngineError::InvalidParameters {
            family,
            discriminant: discriminant.clone(),
            source,
        })
    }
}

/// Factory for a part without parameters. Any field besides the tag is
/// rejected.
fn no_params<T: Copy + 'static>(
    family: Family,
    discriminant: &str,
    part: T,
) -> impl Fn(&Registry, Map<String, Value>) -> Result<T> + 'static {
    let discriminant = discriminant.to_string();
    move |_: &Registry, params: Map<String, Value>| {
        record::finish(family, &discriminant, &params)?;
        Ok(part)
    }
}

fn lookup<'a, T>(table: &'a FxHashMap<String, T>, family: Family, discriminant: &str) -> Result<&'a T> {
    table
        .get(&normalize_discriminant(discriminant))
        .ok_or_else(|| EngineError::UnknownDiscriminant {
            family,
            discriminant: discriminant.to_string(),
        })
}

fn claim<T>(table: &FxHashMap<String, T>, family: Family, discriminant: &str) -> String {
    let key = normalize_discriminant(discriminant);
    if table.contains_key(&key) {
        panic!("{family} {discriminant} already registered (as {key})");
    }
    key
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in rule part.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();

        // === Actions ===
        registry.register_reversible_action::<ChangeAttack>("change_attack");
        registry.register_reversible_action::<ChangeHealth>("change_health");
        registry.register_reversible_action_with("taunt", no_params(Family::Action, "taunt", Taunt));
        registry.register_action::<Damage>("damage");
        registry.register_action::<Heal>("heal");

        // === Conditions ===
        registry.register_condition_with("is_self", no_params(Family::Condition, "is_self", IsSelf));
        registry.register_condition_with("is_minion", no_params(Family::Condition, "is_minion", IsMinion));
        registry.register_condition_with("is_hero", no_params(Family::Condition, "is_hero", IsHero));
        registry.register_condition_with(
            "focus_is_friendly",
            no_params(Family::Condition, "focus_is_friendly", FocusIsFriendly),
        );
        registry.register_condition::<AmountAtLeast>("amount_at_least");
        registry.register_condition_with("not", |registry, mut params| {
            let inner = record::take_field(Family::Condition, &mut params, "condition")?;
            record::finish(Family::Condition, "not", &params)?;
            Ok(Not {
                condition: registry.condition(&inner)?,
            })
        });
        registry.register_condition_with("and", |registry, mut params| {
            Ok(And {
                conditions: registry.condition_list("and", &mut params)?,
            })
        });
        registry.register_condition_with("or", |registry, mut params| {
            Ok(Or {
                conditions: registry.condition_list("or", &mut params)?,
            })
        });

        // === Selectors ===
        registry.register_selector_with("minion", no_params(Family::Selector, "minion", AllMinions));
        registry.register_selector_with("not_self", no_params(Family::Selector, "not_self", NotSelf));
        registry.register_selector_with("damaged", no_params(Family::Selector, "damaged", Damaged));
        registry.register_selector_with("has_taunt", no_params(Family::Selector, "has_taunt", HasTaunt));
        registry.register_selector_with(
            "has_lowest_health",
            no_params(Family::Selector, "has_lowest_health", HasLowestHealth),
        );

        // === Targetings ===
        registry.register_targeting_with("self", no_params(Family::Targeting, "self", SelfTarget));
        registry.register_targeting_with("focus", no_params(Family::Targeting, "focus", FocusTarget));
        registry.register_targeting_with("other", no_params(Family::Targeting, "other", OtherTarget));
        registry.register_targeting_with("focus_or_self", no_params(Family::Targeting, "focus_or_self", FocusOrSelf));
        registry.register_targeting_with("owner_hero", no_params(Family::Targeting, "owner_hero", OwnerHero));
        registry.register_targeting_with("opponent_hero", no_params(Family::Targeting, "opponent_hero", OpponentHero));

        // === Events ===
        registry.register_event(occurrence::DAMAGED, EventScope::Minion);
        registry.register_event(occurrence::CHARACTER_DAMAGED, EventScope::Player);
        registry.register_event(occurrence::TURN_ENDED, EventScope::Player);
        registry.register_event(occurrence::TURN_STARTED, EventScope::Player);
        registry.register_event(occurrence::MINION_SUMMONED, EventScope::Player);

        registry
    }

    // === Registration ===
    //
    // Registering a discriminant twice is a startup bug and panics.
    //
    // A discriminant only selects the factory. Parts write their own
    // discriminant in `to_record`, so a type registered under an alias
    // loads from the alias but saves under the name it writes itself.

    /// Register an action whose parameters deserialize into `T`.
    ///
    /// `T::to_record` decides the discriminant written back out. Registering
    /// a built-in under a second name makes that name loadable only.
    pub fn register_action<T>(&mut self, discriminant: &str)
    where
        T: Action + DeserializeOwned + 'static,
    {
        self.register_action_with(discriminant, from_params::<T>(Family::Action, discriminant));
    }

    /// Register an action built by `build`.
    pub fn register_action_with<T, F>(&mut self, discriminant: &str, build: F)
    where
        T: Action + 'static,
        F: Fn(&Registry, Map<String, Value>) -> Result<T> + 'static,
    {
        let key = claim(&self.actions, Family::Action, discriminant);
        let action: Factory<dyn Action> = Box::new(move |registry: &Registry, params: Map<String, Value>| {
            Ok(Rc::new(build(registry, params)?) as Rc<dyn Action>)
        });
        self.actions.insert(key, ActionFactories { action, reversible: None });
    }

    /// Register a reversible action whose parameters deserialize into `T`.
    pub fn register_reversible_action<T>(&mut self, discriminant: &str)
    where
        T: ReversibleAction + DeserializeOwned + 'static,
    {
        self.register_reversible_action_with(discriminant, from_params::<T>(Family::Action, discriminant));
    }

    /// Register a reversible action built by `build`.
    ///
    /// It resolves both as a plain action and as a reversible one.
    pub fn register_reversible_action_with<T, F>(&mut self, discriminant: &str, build: F)
    where
        T: ReversibleAction + 'static,
        F: Fn(&Registry, Map<String, Value>) -> Result<T> + 'static,
    {
        let key = claim(&self.actions, Family::Action, discriminant);
        let build = Rc::new(build);
        let plain = Rc::clone(&build);

        let action: Factory<dyn Action> = Box::new(move |registry: &Registry, params: Map<String, Value>| {
            Ok(Rc::new((*plain)(registry, params)?) as Rc<dyn Action>)
        });
        let reversible: Factory<dyn ReversibleAction> =
            Box::new(move |registry: &Registry, params: Map<String, Value>| {
                Ok(Rc::new((*build)(registry, params)?) as Rc<dyn ReversibleAction>)
            });
        self.actions.insert(
            key,
            ActionFactories {
                action,
                reversible: Some(reversible),
            },
        );
    }

    /// Register a condition whose parameters deserialize into `T`.
    pub fn register_condition<T>(&mut self, discriminant: &str)
    where
        T: Condition + DeserializeOwned + 'static,
    {
        self.register_condition_with(discriminant, from_params::<T>(Family::Condition, discriminant));
    }

    /// Register a condition built by `build`.
    pub fn register_condition_with<T, F>(&mut self, discriminant: &str, build: F)
    where
        T: Condition + 'static,
        F: Fn(&Registry, Map<String, Value>) -> Result<T> + 'static,
    {
        let key = claim(&self.conditions, Family::Condition, discriminant);
        let factory: Factory<dyn Condition> = Box::new(move |registry: &Registry, params: Map<String, Value>| {
            Ok(Rc::new(build(registry, params)?) as Rc<dyn Condition>)
        });
        self.conditions.insert(key, factory);
    }

    /// Register a selector whose parameters deserialize into `T`.
    pub fn register_selector<T>(&mut self, discriminant: &str)
    where
        T: Selector + DeserializeOwned + 'static,
    {
        self.register_selector_with(discriminant, from_params::<T>(Family::Selector, discriminant));
    }

    /// Register a selector built by `build`.
    pub fn register_selector_with<T, F>(&mut self, discriminant: &str, build: F)
    where
        T: Selector + 'static,
        F: Fn(&Registry, Map<String, Value>) -> Result<T> + 'static,
    {
        let key = claim(&self.selectors, Family::Selector, discriminant);
        let factory: Factory<dyn Selector> = Box::new(move |registry: &Registry, params: Map<String, Value>| {
            Ok(Rc::new(build(registry, params)?) as Rc<dyn Selector>)
        });
        self.selectors.insert(key, factory);
    }

    /// Register a targeting whose parameters deserialize into `T`.
    pub fn register_targeting<T>(&mut self, discriminant: &str)
    where
        T: Targeting + DeserializeOwned + 'static,
    {
        self.register_targeting_with(discriminant, from_params::<T>(Family::Targeting, discriminant));
    }

    /// Register a targeting built by `build`.
    pub fn register_targeting_with<T, F>(&mut self, discriminant: &str, build: F)
    where
        T: Targeting + 'static,
        F: Fn(&Registry, Map<String, Value>) -> Result<T> + 'static,
    {
        let key = claim(&self.targetings, Family::Targeting, discriminant);
        let factory: Factory<dyn Targeting> = Box::new(move |registry: &Registry, params: Map<String, Value>| {
            Ok(Rc::new(build(registry, params)?) as Rc<dyn Targeting>)
        });
        self.targetings.insert(key, factory);
    }

    /// Register an occurrence name and the surface it is fired on.
    ///
    /// `name` is kept as given and becomes the name deserialized events
    /// bind to.
    pub fn register_event(&mut self, name: &str, scope: EventScope) {
        let key = claim(&self.events, Family::Event, name);
        self.events.insert(key, (name.to_string(), scope));
    }

    /// Check if a discriminant is registered for `family`.
    #[must_use]
    pub fn is_registered(&self, family: Family, discriminant: &str) -> bool {
        let key = normalize_discriminant(discriminant);
        match family {
            Family::Action => self.actions.contains_key(&key),
            Family::Condition => self.conditions.contains_key(&key),
            Family::Selector => self.selectors.contains_key(&key),
            Family::Targeting => self.targetings.contains_key(&key),
            Family::Event => self.events.contains_key(&key),
            Family::Effect | Family::Aura => false,
        }
    }

    // === Deserialization ===

    pub fn action(&self, record: &Value) -> Result<Rc<dyn Action>> {
        let (discriminant, params) = record::split(Family::Action, TYPE_TAG, record)?;
        let entry = lookup(&self.actions, Family::Action, &discriminant)?;
        (entry.action)(self, params)
    }

    /// Deserialize an action that must be reversible.
    pub fn reversible_action(&self, record: &Value) -> Result<Rc<dyn ReversibleAction>> {
        let (discriminant, params) = record::split(Family::Action, TYPE_TAG, record)?;
        let entry = lookup(&self.actions, Family::Action, &discriminant)?;
        let factory = entry
            .reversible
            .as_ref()
            .ok_or(EngineError::NotReversible(discriminant))?;
        factory(self, params)
    }

    pub fn condition(&self, record: &Value) -> Result<Rc<dyn Condition>> {
        let (discriminant, params) = record::split(Family::Condition, TYPE_TAG, record)?;
        lookup(&self.conditions, Family::Condition, &discriminant)?(self, params)
    }

    pub fn selector(&self, record: &Value) -> Result<Rc<dyn Selector>> {
        let (discriminant, params) = record::split(Family::Selector, TYPE_TAG, record)?;
        lookup(&self.selectors, Family::Selector, &discriminant)?(self, params)
    }

    pub fn targeting(&self, record: &Value) -> Result<Rc<dyn Targeting>> {
        let (discriminant, params) = record::split(Family::Targeting, TYPE_TAG, record)?;
        lookup(&self.targetings, Family::Targeting, &discriminant)?(self, params)
    }

    /// Deserialize `{ event_name, scope?, condition? }`.
    ///
    /// A registered name binds under its registered spelling. The record's
    /// `scope` wins over the registered one; without it the registered
    /// scope is used, and an unregistered name cannot be resolved.
    pub fn event(&self, record: &Value) -> Result<Event> {
        let (name, mut params) = record::split(Family::Event, EVENT_TAG, record)?;
        let scope = record::take_optional(&mut params, "scope")
            .map(|value| parse_option::<EventScope>(Family::Event, "scope", value))
            .transpose()?;
        let condition = record::take_optional(&mut params, "condition");
        record::finish(Family::Event, &name, &params)?;

        let event = match (self.events.get(&normalize_discriminant(&name)), scope) {
            (Some((canonical, registered)), scope) => Event::new(canonical.clone(), scope.unwrap_or(*registered)),
            (None, Some(scope)) => Event::new(name, scope),
            (None, None) => {
                return Err(EngineError::UnknownDiscriminant {
                    family: Family::Event,
                    discriminant: name,
                })
            }
        };
        match condition {
            Some(condition) => Ok(event.with_shared_condition(self.condition(&condition)?)),
            None => Ok(event),
        }
    }

    /// Deserialize `{ event, action, targeting }`.
    pub fn effect(&self, record: &Value) -> Result<Effect> {
        let mut fields = record::object(Family::Effect, record)?;
        let event = self.event(&record::take_field(Family::Effect, &mut fields, "event")?)?;
        let action = self.action(&record::take_field(Family::Effect, &mut fields, "action")?)?;
        let targeting = self.targeting(&record::take_field(Family::Effect, &mut fields, "targeting")?)?;
        record::finish(Family::Effect, "effect", &fields)?;
        Ok(Effect::from_parts(event, action, targeting))
    }

    /// Deserialize `{ action, until }`. The action must be reversible.
    pub fn player_aura(&self, record: &Value) -> Result<PlayerAura> {
        let mut fields = record::object(Family::Aura, record)?;
        let action = self.reversible_action(&record::take_field(Family::Aura, &mut fields, "action")?)?;
        let until = self.event(&record::take_field(Family::Aura, &mut fields, "until")?)?;
        record::finish(Family::Aura, "player aura", &fields)?;
        Ok(PlayerAura::from_parts(action, until))
    }

    /// Deserialize `{ action, selector, players?, removal? }`. The action
    /// must be reversible.
    pub fn minion_aura(&self, record: &Value) -> Result<MinionAura> {
        let mut fields = record::object(Family::Aura, record)?;
        let action = self.reversible_action(&record::take_field(Family::Aura, &mut fields, "action")?)?;
        let selector = self.selector(&record::take_field(Family::Aura, &mut fields, "selector")?)?;

        let mut aura = MinionAura::from_parts(action, selector);
        if let Some(players) = record::take_optional(&mut fields, "players") {
            aura = aura.with_players(parse_option::<PlayerScope>(Family::Aura, "players", players)?);
        }
        if let Some(removal) = record::take_optional(&mut fields, "removal") {
            aura = aura.with_removal(parse_option::<AuraRemoval>(Family::Aura, "removal", removal)?);
        }
        record::finish(Family::Aura, "minion aura", &fields)?;
        Ok(aura)
    }

    fn condition_list(&self, discriminant: &str, params: &mut Map<String, Value>) -> Result<Vec<Rc<dyn Condition>>> {
        let conditions = record::take_field(Family::Condition, params, "conditions")?;
        record::finish(Family::Condition, discriminant, params)?;
        match conditions {
            Value::Array(items) => items.iter().map(|item| self.condition(item)).collect(),
            other => Err(EngineError::MalformedRecord {
                family: Family::Condition,
                reason: format!("`conditions` must be an array, found {other}"),
            }),
        }
    }
}

fn parse_option<T: DeserializeOwned>(family: Family, field: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| EngineError::InvalidParameters {
        family,
        discriminant: field.to_string(),
        source,
    })
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("actions", &self.actions.len())
            .field("conditions", &self.conditions.len())
            .field("selectors", &self.selectors.len())
            .field("targetings", &self.targetings.len())
            .field("events", &self.events.len())
            .finish()
    }
}
