//! Component definitions and live-instance bookkeeping.
//!
//! Three tables back the lifecycle engine, all explicitly constructed (no
//! ambient singletons) so tests can run isolated copies:
//!
//! - [`DefinitionTable`]: selector → [`ComponentDef`], populated by
//!   registration calls, never removed from.
//! - [`ServiceRegistry`]: opaque token → resolved [`Service`] value.
//! - [`InstanceRegistry`]: the authoritative index of live element↔component
//!   relationships, co-maintaining an element index and a selector index.
//!
//! Components are plain objects implementing [`Component`]. Lifecycle hooks
//! are opt-in capability traits ([`OnInject`], [`OnReady`], [`OnResize`],
//! [`OnDestroy`]); the engine asks for each capability through the
//! `Component::as_*` casts instead of probing for method presence.

mod component;
mod def;
mod definitions;
mod instance;
mod instances;
mod services;

pub use component::{Component, OnDestroy, OnInject, OnReady, OnResize, Service};
pub use def::{ChildSpec, ComponentDef, Constructor, InitListener, TemplateSpec};
pub use definitions::DefinitionTable;
pub use instance::{ComponentInstance, InstanceHandle, InstanceId, WeakInstanceHandle};
pub use instances::{InstanceRegistry, LINKED_ATTR};
pub use services::ServiceRegistry;
