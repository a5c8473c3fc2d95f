//! The creation pipeline.
//!
//! One instance progresses: dedup check → allocation and immediate
//! element-indexing → template source resolution (possibly suspending on a
//! remote fetch) → render → child resolution → class-initialized listeners →
//! inject → ready → resize attachment → selector-index commit. Everything
//! except the fetch is synchronous on the caller's thread; the element index
//! is written before any other pipeline work so re-entrant scans observe the
//! binding.

use std::sync::Arc;

use tracing::{debug, trace, warn};
use weft_dom::NodeId;
use weft_registry::{
	ComponentDef, ComponentInstance, InstanceHandle, Service, TemplateSpec, LINKED_ATTR,
};

use crate::engine::Core;
use crate::template::TEMPLATE_SOURCE_ATTR;

/// Runs `element` through the single-instance pipeline, returning the
/// existing instance unchanged when the (element, selector, identifier)
/// triple is already bound.
pub(crate) fn create_for_element(
	core: &Arc<Core>,
	def: &Arc<ComponentDef>,
	element: NodeId,
) -> InstanceHandle {
	let doc = &core.doc;
	let identifier = doc.selector_value(element, &def.selector);

	// Dedup before anything else; re-binding is a no-op.
	for existing in core.instances.lookup_by_element(element) {
		if existing.selector() == def.selector && existing.identifier() == identifier {
			return existing;
		}
	}

	if let Some(restrict) = &def.restrict
		&& !doc.matches(element, restrict)
	{
		warn!(
			selector = %def.selector,
			restrict = %restrict,
			?element,
			"element does not satisfy the restriction; binding anyway"
		);
	}

	let handle = InstanceHandle::new(ComponentInstance::new(
		def.selector.clone(),
		identifier,
		element,
		def.construct(),
		def.on_initialized.clone(),
	));
	// Indexed immediately so nested scans see the element as bound.
	core.instances.index_element(doc, element, &handle);
	trace!(selector = %def.selector, ?element, id = ?handle.id(), "instance created");

	let override_url = doc.selector_value(element, TEMPLATE_SOURCE_ATTR);
	let url = override_url.or_else(|| match &def.template {
		TemplateSpec::Url(url) => Some(url.clone()),
		_ => None,
	});

	match url {
		Some(url) => resolve_remote(core, def, &handle, url),
		None => {
			let content = resolve_local(core, def, element);
			finish_initialization(core, def, &handle, content);
		}
	}

	handle
}

/// Template precedence (b): the remote URL path. A cache hit resolves
/// synchronously; a miss issues one fetch whose continuation resumes the
/// pipeline for this instance only.
fn resolve_remote(core: &Arc<Core>, def: &Arc<ComponentDef>, handle: &InstanceHandle, url: String) {
	if def.cache_remote
		&& let Some(cached) = core.templates.get(&url)
	{
		finish_initialization(core, def, handle, Some(cached));
		return;
	}

	let weak_core = Arc::downgrade(core);
	let def = def.clone();
	let handle = handle.clone();
	let caching = def.cache_remote;
	let continuation_url = url.clone();
	core.fetcher.fetch(
		&url,
		Box::new(move |result| {
			let Some(core) = weak_core.upgrade() else {
				return;
			};
			match result {
				Ok(text) => {
					if !is_live(&core, &handle) {
						trace!(url = %continuation_url, "dropping stale template fetch");
						return;
					}
					if caching {
						core.templates.insert(&continuation_url, &text);
					}
					finish_initialization(&core, &def, &handle, Some(text));
				}
				Err(err) => {
					warn!(
						url = %continuation_url,
						selector = %def.selector,
						%err,
						"template fetch failed; unwinding binding"
					);
					unwind_binding(&core, &handle);
				}
			}
		}),
	);
}

/// Template precedence (c): no URL. Inline markup, a referenced
/// template-by-id, or a `<template>` child of the bound element.
fn resolve_local(core: &Arc<Core>, def: &ComponentDef, element: NodeId) -> Option<String> {
	let doc = &core.doc;
	match &def.template {
		TemplateSpec::Inline(markup) => Some(markup.clone()),
		TemplateSpec::ById(id) => {
			let found = doc.get_element_by_id(id);
			if found.is_none() {
				debug!(selector = %def.selector, template_id = %id, "template element not found");
			}
			found.map(|t| doc.inner_markup(t))
		}
		TemplateSpec::None | TemplateSpec::Url(_) => doc
			.first_child_with_tag(element, "template")
			.map(|t| doc.inner_markup(t)),
	}
}

/// True while the instance is still bound, i.e. still indexed for its
/// element. Connectivity is not required: a detached fragment awaiting
/// insertion may resume. Guards fetch continuations against acting on an
/// element that was torn down while the request was in flight.
fn is_live(core: &Core, handle: &InstanceHandle) -> bool {
	let Some(element) = handle.element() else {
		return false;
	};
	core.instances
		.lookup_by_element(element)
		.iter()
		.any(|i| i.ptr_eq(handle))
}

/// Removes a partially bound instance after a failed fetch so a later scan
/// may retry the element.
fn unwind_binding(core: &Core, handle: &InstanceHandle) {
	let Some(element) = handle.element() else {
		return;
	};
	core.instances.unbind(element, handle.id());
	if core.instances.lookup_by_element(element).is_empty() {
		core.doc.remove_attr(element, LINKED_ATTR);
	}
	handle.clear();
}

/// The synchronous back half of the pipeline, entered directly or from a
/// fetch continuation.
fn finish_initialization(
	core: &Arc<Core>,
	def: &Arc<ComponentDef>,
	handle: &InstanceHandle,
	content: Option<String>,
) {
	let Some(element) = handle.element() else {
		return;
	};

	if let Some(content) = content {
		// Rendering displaces the element's children. Any already-bound
		// descendant must be torn down first, or its instance would outlive
		// its element with no removal record ever delivered for it.
		for displaced in core.doc.query_all_by_attr(element, LINKED_ATTR, None) {
			destroy_element(core, displaced);
		}
		core.doc.set_inner_markup(element, &content);
		handle.with(|instance| instance.template = Some(content));
	}

	resolve_children(core, def, handle, element);

	for listener in handle.drain_init_listeners() {
		listener(handle);
	}

	call_inject(core, def, handle);
	call_ready(handle);
	attach_resize(core, handle);

	core.instances.index_selector(&def.selector, handle);
	trace!(selector = %def.selector, id = ?handle.id(), "instance ready");
}

/// Resolves declared children in declaration order. Matched elements are
/// recorded per spec; elements whose selector has a registered definition
/// are run through the same pipeline (reusing bound instances).
fn resolve_children(
	core: &Arc<Core>,
	def: &Arc<ComponentDef>,
	parent: &InstanceHandle,
	element: NodeId,
) {
	for spec in &def.children {
		let elements =
			core.doc
				.query_all_by_attr(element, &spec.selector, spec.identifier.as_deref());

		let mut resolved = Vec::new();
		if let Some(child_def) = core.defs.get(&spec.selector) {
			for &child_element in &elements {
				let existing = core
					.instances
					.lookup_by_element(child_element)
					.into_iter()
					.find(|i| {
						i.selector() == spec.selector
							&& spec
								.identifier
								.as_deref()
								.is_none_or(|want| i.identifier().as_deref() == Some(want))
					});
				let child = existing
					.unwrap_or_else(|| create_for_element(core, &child_def, child_element));
				resolved.push(child);
			}
		}

		parent.with(|instance| {
			instance.children.insert(spec.raw.clone(), elements);
			instance.child_components.insert(spec.raw.clone(), resolved);
		});
	}
}

/// Tears down every instance bound to `element`: destroy hook, then clear
/// internal references so the objects become collectable. A miss is a no-op.
pub(crate) fn destroy_element(core: &Arc<Core>, element: NodeId) {
	let instances = core.instances.unindex(element);
	for handle in instances {
		let mut component = handle.take_component();
		if let Some(component) = component.as_deref_mut()
			&& let Some(hook) = component.as_destroy()
		{
			hook.on_destroy();
		}
		// The component object is dropped here, not returned to the record.
		drop(component);
		handle.clear();
		trace!(id = ?handle.id(), ?element, "instance destroyed");
	}
}

fn call_inject(core: &Core, def: &ComponentDef, handle: &InstanceHandle) {
	let mut component = handle.take_component();
	if let Some(component) = component.as_deref_mut()
		&& let Some(hook) = component.as_inject()
	{
		let services: Vec<Option<Service>> =
			def.inject.iter().map(|token| core.services.get(token)).collect();
		handle.with(|instance| instance.services = services.clone());
		hook.on_inject(services);
	}
	handle.put_component(component);
}

fn call_ready(handle: &InstanceHandle) {
	let mut component = handle.take_component();
	if let Some(component) = component.as_deref_mut()
		&& let Some(hook) = component.as_ready()
	{
		hook.on_ready();
	}
	handle.put_component(component);
}

/// Attaches a host resize listener for the instance's lifetime when the
/// capability is present. The listener entry itself is never detached; it
/// holds the instance weakly, so delivery after destruction is a no-op.
fn attach_resize(core: &Core, handle: &InstanceHandle) {
	let mut component = handle.take_component();
	let wants_resize = component
		.as_deref_mut()
		.is_some_and(|c| c.as_resize().is_some());
	handle.put_component(component);
	if !wants_resize {
		return;
	}

	let weak = handle.downgrade();
	core.doc.add_resize_listener(move || {
		let Some(handle) = weak.upgrade() else {
			return;
		};
		let mut component = handle.take_component();
		if let Some(component) = component.as_deref_mut()
			&& let Some(hook) = component.as_resize()
		{
			hook.on_resize();
		}
		handle.put_component(component);
	});
}
