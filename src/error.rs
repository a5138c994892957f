//! Error types for the effect engine.

use std::fmt;

use thiserror::Error;

use crate::core::EntityId;

/// Rule family a serialized record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Action,
    Condition,
    Selector,
    Targeting,
    Event,
    Effect,
    Aura,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Action => "action",
            Family::Condition => "condition",
            Family::Selector => "selector",
            Family::Targeting => "targeting",
            Family::Event => "event",
            Family::Effect => "effect",
            Family::Aura => "aura",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    // === Deserialization ===
    #[error("unknown {family} discriminant: {discriminant}")]
    UnknownDiscriminant { family: Family, discriminant: String },

    #[error("malformed {family} record: {reason}")]
    MalformedRecord { family: Family, reason: String },

    #[error("invalid parameters for {family} {discriminant}")]
    InvalidParameters {
        family: Family,
        discriminant: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("action {0} is not reversible")]
    NotReversible(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // === Runtime ===
    #[error("entity not found: {0}")]
    UnknownEntity(EntityId),

    #[error("entity is not a player: {0}")]
    NotAPlayer(EntityId),

    #[error("{key} on {entity} out of range")]
    StatOverflow { entity: EntityId, key: String },

    // === Contract violations ===
    #[error("{0} is already active")]
    AlreadyActive(&'static str),

    #[error("{0} is not active")]
    NotActive(&'static str),

    #[error("aura {0} is not active")]
    AuraNotActive(u32),

    #[error("listener {listener} is not bound to {event_name} on {surface}")]
    ListenerNotBound {
        surface: EntityId,
        event_name: String,
        listener: u64,
    },

    #[error("binding for {bound} cannot be released by event {event_name}")]
    BindingMismatch { bound: String, event_name: String },

    #[error("{event_name} on {surface} fired while it is already being handled")]
    ReentrantDispatch { surface: EntityId, event_name: String },

    #[error("dispatch depth limit of {0} exceeded")]
    DispatchDepthExceeded(usize),
}

pub type Result<T> = std::result::Result<T, EngineError>;
