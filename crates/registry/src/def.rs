use std::sync::Arc;

use crate::component::Component;
use crate::instance::InstanceHandle;

/// Builds a fresh component object for each bound element.
pub type Constructor = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// Listener fired once per instance after template and child resolution,
/// before the inject and ready hooks. Cross-cutting extensions register these
/// on the definition; the engine copies them onto every instance.
pub type InitListener = Arc<dyn Fn(&InstanceHandle) + Send + Sync>;

/// Where a definition's template content comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSpec {
	/// No declared template; a `<template>` child of the bound element is
	/// used when present.
	#[default]
	None,
	/// Inline markup, rendered verbatim.
	Inline(String),
	/// The inner markup of the in-document element with this `id`.
	ById(String),
	/// Fetched from a remote URL.
	Url(String),
}

/// One declared child selector spec: `sel` or `sel=identifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSpec {
	/// The spec exactly as declared; key of the instance child maps.
	pub raw: String,
	pub selector: String,
	/// Identifier filter: only descendants whose selector attribute carries
	/// this value match.
	pub identifier: Option<String>,
}

impl ChildSpec {
	pub fn parse(spec: &str) -> Self {
		match spec.split_once('=') {
			Some((selector, identifier)) => Self {
				raw: spec.to_string(),
				selector: selector.to_string(),
				identifier: Some(identifier.to_string()),
			},
			None => Self {
				raw: spec.to_string(),
				selector: spec.to_string(),
				identifier: None,
			},
		}
	}
}

/// Static description of a component kind.
#[derive(Clone)]
pub struct ComponentDef {
	/// Attribute name recognizing bound elements; unique table key.
	pub selector: String,
	/// Simple selector the bound element is expected to match; violations are
	/// logged, never fatal.
	pub restrict: Option<String>,
	pub template: TemplateSpec,
	/// Whether remote template text is served from / written to the cache.
	pub cache_remote: bool,
	/// Declared children, resolved in declaration order.
	pub children: Vec<ChildSpec>,
	/// Injection tokens, resolved positionally.
	pub inject: Vec<String>,
	/// Class-initialized listeners, invoked in registration order.
	pub on_initialized: Vec<InitListener>,
	constructor: Constructor,
}

impl ComponentDef {
	pub fn new(
		selector: impl Into<String>,
		constructor: impl Fn() -> Box<dyn Component> + Send + Sync + 'static,
	) -> Self {
		Self {
			selector: selector.into(),
			restrict: None,
			template: TemplateSpec::None,
			cache_remote: false,
			children: Vec::new(),
			inject: Vec::new(),
			on_initialized: Vec::new(),
			constructor: Arc::new(constructor),
		}
	}

	pub fn restrict(mut self, selector: impl Into<String>) -> Self {
		self.restrict = Some(selector.into());
		self
	}

	pub fn template(mut self, template: TemplateSpec) -> Self {
		self.template = template;
		self
	}

	pub fn cache_remote(mut self, enabled: bool) -> Self {
		self.cache_remote = enabled;
		self
	}

	/// Declares child selector specs (`sel` or `sel=identifier`), in order.
	pub fn children<I, S>(mut self, specs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.children = specs.into_iter().map(|s| ChildSpec::parse(s.as_ref())).collect();
		self
	}

	/// Declares injection tokens, in order.
	pub fn inject<I, S>(mut self, tokens: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.inject = tokens.into_iter().map(Into::into).collect();
		self
	}

	/// Registers a class-initialized listener.
	pub fn on_initialized(mut self, listener: impl Fn(&InstanceHandle) + Send + Sync + 'static) -> Self {
		self.on_initialized.push(Arc::new(listener));
		self
	}

	/// Allocates a fresh component object.
	pub fn construct(&self) -> Box<dyn Component> {
		(self.constructor)()
	}
}

impl std::fmt::Debug for ComponentDef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentDef")
			.field("selector", &self.selector)
			.field("restrict", &self.restrict)
			.field("template", &self.template)
			.field("cache_remote", &self.cache_remote)
			.field("children", &self.children)
			.field("inject", &self.inject)
			.finish_non_exhaustive()
	}
}
