//! Creation pipeline, hooks, and registry behavior over a live document.

mod common;

use std::sync::Arc;

use common::{entries, log, Inert, ManualFetcher, Probe};
use pretty_assertions::assert_eq;
use weft_dom::Document;
use weft_engine::{Engine, TemplateFetcher};
use weft_registry::{ComponentDef, TemplateSpec, LINKED_ATTR};

#[test]
fn widget_with_inline_template_binds_and_renders() {
	common::init_tracing();
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_components(
		vec![Probe::def("widget", &events)
			.template(TemplateSpec::Inline("<b>hi</b>".to_string()))],
		None,
	);

	let element = doc.create_element("div");
	doc.set_attr(element, "widget", "");
	doc.append_child(doc.root(), element);

	assert_eq!(doc.inner_markup(element), "<b>hi</b>");
	assert!(doc.has_attr(element, LINKED_ATTR));
	assert_eq!(entries(&events), vec!["widget:inject[]", "widget:ready"]);

	let bound = engine.instances().lookup_by_selector("widget");
	assert_eq!(bound.len(), 1);
	assert_eq!(bound[0].element(), Some(element));
	assert_eq!(bound[0].template().as_deref(), Some("<b>hi</b>"));
}

#[test]
fn parent_resolves_declared_children() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_components(
		vec![
			Probe::def("parent", &events).children(["child"]),
			Probe::def("child", &events),
		],
		None,
	);

	let parent = doc.create_element("div");
	doc.set_attr(parent, "parent", "");
	let child = doc.create_element("div");
	doc.set_attr(child, "child", "");
	doc.append_child(parent, child);
	doc.append_child(doc.root(), parent);

	let parents = engine.instances().lookup_by_selector("parent");
	assert_eq!(parents.len(), 1);

	let resolved = parents[0].child_components("child");
	assert_eq!(resolved.len(), 1);
	assert_eq!(resolved[0].element(), Some(child));
	assert_eq!(parents[0].child_elements("child"), vec![child]);

	// Child ready fires during the parent's child resolution step.
	assert_eq!(
		entries(&events),
		vec!["child:inject[]", "child:ready", "parent:inject[]", "parent:ready"]
	);
}

#[test]
fn removal_destroys_parent_and_descendants() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_components(
		vec![
			Probe::def("parent", &events).children(["child"]),
			Probe::def("child", &events),
		],
		None,
	);

	let parent = doc.create_element("div");
	doc.set_attr(parent, "parent", "");
	let child = doc.create_element("div");
	doc.set_attr(child, "child", "");
	doc.append_child(parent, child);
	doc.append_child(doc.root(), parent);

	let bound = engine.instances().lookup_by_selector("parent");
	assert_eq!(bound.len(), 1);
	let parent_instance = bound[0].clone();

	events.lock().clear();
	doc.remove(parent);

	let destroyed: Vec<String> = entries(&events);
	assert!(destroyed.contains(&"parent:destroy".to_string()));
	assert!(destroyed.contains(&"child:destroy".to_string()));

	assert!(engine.instances().lookup_by_element(parent).is_empty());
	assert!(engine.instances().lookup_by_element(child).is_empty());
	assert!(engine.instances().lookup_by_selector("parent").is_empty());
	assert!(engine.instances().lookup_by_selector("child").is_empty());

	// Internal references are cleared so the objects can be collected.
	assert_eq!(parent_instance.element(), None);
	assert_eq!(parent_instance.template(), None);
	assert!(parent_instance.child_components("child").is_empty());
}

#[test]
fn rendering_destroys_displaced_bound_descendants() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	// The child's selector registers first, so discovery binds the child
	// before the parent renders over it.
	engine.register_components(
		vec![
			Probe::def("child", &events),
			Probe::def("parent", &events)
				.template(TemplateSpec::Inline("<b>hi</b>".to_string())),
		],
		None,
	);

	let parent = doc.create_element("div");
	doc.set_attr(parent, "parent", "");
	let child = doc.create_element("div");
	doc.set_attr(child, "child", "");
	doc.append_child(parent, child);
	doc.append_child(doc.root(), parent);

	assert_eq!(
		entries(&events),
		vec![
			"child:inject[]",
			"child:ready",
			"child:destroy",
			"parent:inject[]",
			"parent:ready"
		]
	);
	assert!(engine.instances().lookup_by_selector("child").is_empty());
	assert!(engine.instances().lookup_by_element(child).is_empty());
	assert_eq!(doc.inner_markup(parent), "<b>hi</b>");

	// The displaced element's id stays usable after the render.
	assert!(!doc.is_connected(child));

	events.lock().clear();
	doc.remove(parent);
	assert_eq!(entries(&events), vec!["parent:destroy"]);
}

#[test]
fn rescanning_is_idempotent() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	let element = doc.create_element("div");
	doc.set_attr(element, "widget", "");
	doc.append_child(doc.root(), element);

	engine.register_components(vec![Probe::def("widget", &events)], None);
	engine.register_components(vec![Probe::def("widget", &events)], None);

	let bound = engine.instances().lookup_by_selector("widget");
	assert_eq!(bound.len(), 1);
	assert_eq!(entries(&events), vec!["widget:inject[]", "widget:ready"]);

	// The single-element entry point returns the existing instance unchanged.
	let again = engine.create_component_with_element(element, "widget").unwrap();
	assert!(again.ptr_eq(&bound[0]));
}

#[test]
fn one_element_hosts_instances_of_distinct_selectors() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_components(
		vec![
			Probe::def("alpha", &events)
				.template(TemplateSpec::Inline("<i>a</i>".to_string())),
			Probe::def("beta", &events),
		],
		None,
	);

	let element = doc.create_element("div");
	doc.set_attr(element, "alpha", "");
	doc.set_attr(element, "beta", "");
	doc.append_child(doc.root(), element);

	let on_element = engine.instances().lookup_by_element(element);
	assert_eq!(on_element.len(), 2);
	assert_eq!(engine.instances().lookup_by_selector("alpha").len(), 1);
	assert_eq!(engine.instances().lookup_by_selector("beta").len(), 1);

	let alpha = &engine.instances().lookup_by_selector("alpha")[0];
	let beta = &engine.instances().lookup_by_selector("beta")[0];
	assert_eq!(alpha.template().as_deref(), Some("<i>a</i>"));
	assert_eq!(beta.template(), None);
}

#[test]
fn identifiers_disambiguate_same_selector() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_components(vec![Probe::def("widget", &events)], None);

	let first = doc.create_element("div");
	doc.set_attr(first, "widget", "one");
	let second = doc.create_element("div");
	doc.set_attr(second, "data-widget", "two");
	doc.append_child(doc.root(), first);
	doc.append_child(doc.root(), second);

	assert_eq!(engine.instances().lookup_by_selector("widget").len(), 2);
	let two = engine.instances().lookup_by_selector_and_identifier("widget", "two");
	assert_eq!(two.len(), 1);
	assert_eq!(two[0].element(), Some(second));
}

#[test]
fn child_specs_resolve_in_declaration_order_with_identifier_filters() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_components(
		vec![
			Probe::def("board", &events).children(["item=primary", "item"]),
			Probe::def("item", &events),
		],
		None,
	);

	let board = doc.create_element("div");
	doc.set_attr(board, "board", "");
	let primary = doc.create_element("div");
	doc.set_attr(primary, "item", "primary");
	let secondary = doc.create_element("div");
	doc.set_attr(secondary, "item", "secondary");
	doc.append_child(board, primary);
	doc.append_child(board, secondary);
	doc.append_child(doc.root(), board);

	let instance = &engine.instances().lookup_by_selector("board")[0];

	// Filtered spec only matched the identifier-equal element.
	assert_eq!(instance.child_elements("item=primary"), vec![primary]);
	let filtered = instance.child_components("item=primary");
	assert_eq!(filtered.len(), 1);
	assert_eq!(filtered[0].identifier().as_deref(), Some("primary"));

	// The unfiltered spec matched both, in document order.
	assert_eq!(instance.child_elements("item"), vec![primary, secondary]);
	assert_eq!(instance.child_components("item").len(), 2);

	// Declaration order is preserved in the child maps.
	let keys = instance.with(|i| i.children.keys().cloned().collect::<Vec<_>>());
	assert_eq!(keys, vec!["item=primary", "item"]);
}

#[test]
fn services_inject_positionally_with_none_for_unknown_tokens() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_services([
		("greeting", Arc::new("hello".to_string()) as weft_registry::Service),
	]);
	engine.register_components(
		vec![Probe::def("widget", &events).inject(["greeting", "missing"])],
		None,
	);

	let element = doc.create_element("div");
	doc.set_attr(element, "widget", "");
	doc.append_child(doc.root(), element);

	assert_eq!(entries(&events), vec!["widget:inject[hello,<none>]", "widget:ready"]);

	let instance = &engine.instances().lookup_by_selector("widget")[0];
	let snapshot = instance.with(|i| i.services.clone());
	assert_eq!(snapshot.len(), 2);
	assert!(snapshot[0].is_some());
	assert!(snapshot[1].is_none());
}

#[test]
fn class_initialized_listeners_run_in_order_before_inject_and_ready() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	let first = events.clone();
	let second = events.clone();
	engine.register_components(
		vec![Probe::def("widget", &events)
			.on_initialized(move |_| first.lock().push("init:1".to_string()))
			.on_initialized(move |handle| {
				second.lock().push(format!("init:2:{}", handle.selector()));
			})],
		None,
	);

	let element = doc.create_element("div");
	doc.set_attr(element, "widget", "");
	doc.append_child(doc.root(), element);

	assert_eq!(
		entries(&events),
		vec!["init:1", "init:2:widget", "widget:inject[]", "widget:ready"]
	);
}

#[test]
fn resize_listener_lives_until_destruction() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_components(vec![Probe::def("widget", &events)], None);

	let element = doc.create_element("div");
	doc.set_attr(element, "widget", "");
	doc.append_child(doc.root(), element);

	doc.emit_resize();
	doc.emit_resize();
	assert_eq!(
		entries(&events),
		vec!["widget:inject[]", "widget:ready", "widget:resize", "widget:resize"]
	);

	doc.remove(element);
	events.lock().clear();
	doc.emit_resize();
	assert_eq!(entries(&events), Vec::<String>::new());
}

#[test]
fn missing_hooks_are_no_ops() {
	let doc = Document::new();
	let engine = Engine::new(doc.clone());

	engine.register_components(vec![ComponentDef::new("plain", || Box::new(Inert))], None);

	let element = doc.create_element("div");
	doc.set_attr(element, "plain", "");
	doc.append_child(doc.root(), element);

	assert_eq!(engine.instances().lookup_by_selector("plain").len(), 1);
	doc.emit_resize();
	doc.remove(element);
	assert!(engine.instances().lookup_by_selector("plain").is_empty());
}

#[test]
fn restriction_violation_warns_but_binds() {
	common::init_tracing();
	let doc = Document::new();
	let engine = Engine::new(doc.clone());
	let events = log();

	engine.register_components(
		vec![Probe::def("widget", &events).restrict("input")],
		None,
	);

	let element = doc.create_element("div");
	doc.set_attr(element, "widget", "");
	doc.append_child(doc.root(), element);

	assert_eq!(engine.instances().lookup_by_selector("widget").len(), 1);
}

#[test]
fn engines_are_isolated_per_document() {
	let first_doc = Document::new();
	let second_doc = Document::new();
	let first = Engine::new(first_doc.clone());
	let second = Engine::new(second_doc.clone());
	let events = log();

	first.register_components(vec![Probe::def("widget", &events)], None);

	let element = first_doc.create_element("div");
	first_doc.set_attr(element, "widget", "");
	first_doc.append_child(first_doc.root(), element);

	assert_eq!(first.instances().lookup_by_selector("widget").len(), 1);
	assert!(second.instances().lookup_by_selector("widget").is_empty());
	assert!(second.definitions().is_empty());
}

#[test]
fn dropping_the_engine_retires_its_fetch_continuations() {
	let doc = Document::new();
	let fetcher = ManualFetcher::new();
	let events = log();
	let engine = Engine::builder(doc.clone())
		.fetcher(fetcher.clone() as Arc<dyn TemplateFetcher>)
		.build();

	engine.register_components(
		vec![Probe::def("widget", &events).template(TemplateSpec::Url("/w.html".to_string()))],
		None,
	);
	let element = doc.create_element("div");
	doc.set_attr(element, "widget", "");
	doc.append_child(doc.root(), element);
	assert_eq!(fetcher.pending_count(), 1);

	drop(engine);
	fetcher.complete_next(Ok("<b>late</b>"));
	assert_eq!(doc.inner_markup(element), "");
}
