//! Component lifecycle engine.
//!
//! Discovers elements carrying a registered selector attribute, instantiates
//! a component for each, resolves and renders its template, wires declared
//! children, injects requested services, runs lifecycle hooks, and tears
//! everything down when the element leaves the document. Discovery runs once
//! when the document becomes ready and then incrementally, driven purely by
//! the document's subtree change notifications.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use weft_dom::Document;
//! use weft_engine::Engine;
//! use weft_registry::{Component, ComponentDef, OnReady, TemplateSpec};
//!
//! struct Greeting;
//!
//! impl OnReady for Greeting {
//! 	fn on_ready(&mut self) {}
//! }
//!
//! impl Component for Greeting {
//! 	fn as_ready(&mut self) -> Option<&mut dyn OnReady> {
//! 		Some(self)
//! 	}
//! }
//!
//! let doc = Document::new();
//! let engine = Engine::new(doc.clone());
//! engine.register_components(
//! 	vec![
//! 		ComponentDef::new("greeting", || Box::new(Greeting))
//! 			.template(TemplateSpec::Inline("<b>hi</b>".to_string())),
//! 	],
//! 	None,
//! );
//!
//! let element = doc.create_element("div");
//! doc.set_attr(element, "greeting", "");
//! doc.append_child(doc.root(), element);
//!
//! let bound = engine.instances().lookup_by_selector("greeting");
//! assert_eq!(bound.len(), 1);
//! assert_eq!(doc.inner_markup(element), "<b>hi</b>");
//! ```

#[cfg(test)]
use tracing_subscriber as _;

mod engine;
mod fetch;
mod orchestrator;
mod overlay;
mod template;
mod watcher;

pub use engine::{Engine, EngineBuilder};
pub use fetch::{FetchCallback, FetchError, HttpTemplateFetcher, TemplateFetcher};
pub use overlay::{ActiveRule, InjectionSpot, PathArgs, RouteOverlay};
pub use template::{TemplateCache, TEMPLATE_SOURCE_ATTR};
