//! Persistent representation of rule configuration.
//!
//! Every rule part serializes to a tagged JSON record through its
//! `to_record` method:
//!
//! ```text
//! Action / Condition / Selector / Targeting:  { "type": <discriminant>, ...params }
//! Event:       { "event_name": <name>, "condition"?: Condition }
//! Effect:      { "event": Event, "action": Action, "targeting": Targeting }
//! PlayerAura:  { "action": Action, "until": Event }
//! MinionAura:  { "action": Action, "selector": Selector, "players"?, "removal"? }
//! ```
//!
//! The [`Registry`] turns records back into live parts. Only configuration
//! is persisted; subscriptions and aura activation state are not.

pub mod record;
mod registry;

pub use record::{normalize_discriminant, EVENT_TAG, TYPE_TAG};
pub use registry::Registry;
