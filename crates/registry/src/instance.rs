use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use weft_dom::NodeId;

use crate::component::{Component, Service};
use crate::def::InitListener;

/// Process-unique identity of one live instance. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
	pub(crate) fn fresh() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

/// Lifecycle bookkeeping for one bound occurrence of a definition.
///
/// Owned jointly by the registry indices and any parent's child map; the
/// component object itself carries none of this state. Destruction nulls the
/// element, template, and child maps so the record releases its references
/// even while stale handles remain.
pub struct ComponentInstance {
	id: InstanceId,
	pub selector: String,
	/// Value of the selector attribute on the bound element, disambiguating
	/// multiple instances of the same selector.
	pub identifier: Option<String>,
	pub element: Option<NodeId>,
	/// Rendered template content, if any was resolved.
	pub template: Option<String>,
	/// Declared child spec → matched descendant elements, declaration order.
	pub children: IndexMap<String, Vec<NodeId>>,
	/// Declared child spec → resolved child instances, declaration order.
	pub child_components: IndexMap<String, Vec<InstanceHandle>>,
	/// Snapshot of the values passed to the inject hook.
	pub services: Vec<Option<Service>>,
	component: Option<Box<dyn Component>>,
	init_listeners: Vec<InitListener>,
}

impl ComponentInstance {
	pub fn new(
		selector: String,
		identifier: Option<String>,
		element: NodeId,
		component: Box<dyn Component>,
		init_listeners: Vec<InitListener>,
	) -> Self {
		Self {
			id: InstanceId::fresh(),
			selector,
			identifier,
			element: Some(element),
			template: None,
			children: IndexMap::new(),
			child_components: IndexMap::new(),
			services: Vec::new(),
			component: Some(component),
			init_listeners,
		}
	}

	pub fn id(&self) -> InstanceId {
		self.id
	}
}

/// Cloneable shared handle to a [`ComponentInstance`].
///
/// Hook invocation uses [`InstanceHandle::take_component`] /
/// [`InstanceHandle::put_component`] so no internal lock is held while user
/// code runs; a handle whose component is currently taken simply skips
/// concurrent hook delivery.
#[derive(Clone)]
pub struct InstanceHandle {
	id: InstanceId,
	cell: Arc<Mutex<ComponentInstance>>,
}

impl InstanceHandle {
	pub fn new(instance: ComponentInstance) -> Self {
		Self {
			id: instance.id(),
			cell: Arc::new(Mutex::new(instance)),
		}
	}

	pub fn id(&self) -> InstanceId {
		self.id
	}

	pub fn selector(&self) -> String {
		self.cell.lock().selector.clone()
	}

	pub fn identifier(&self) -> Option<String> {
		self.cell.lock().identifier.clone()
	}

	/// The bound element; `None` once destroyed.
	pub fn element(&self) -> Option<NodeId> {
		self.cell.lock().element
	}

	pub fn template(&self) -> Option<String> {
		self.cell.lock().template.clone()
	}

	/// Matched elements for one declared child spec.
	pub fn child_elements(&self, spec: &str) -> Vec<NodeId> {
		self.cell.lock().children.get(spec).cloned().unwrap_or_default()
	}

	/// Resolved child instances for one declared child spec.
	pub fn child_components(&self, spec: &str) -> Vec<InstanceHandle> {
		self.cell.lock().child_components.get(spec).cloned().unwrap_or_default()
	}

	/// Runs `f` with the bookkeeping record locked. Do not call back into the
	/// same handle from `f`.
	pub fn with<R>(&self, f: impl FnOnce(&mut ComponentInstance) -> R) -> R {
		f(&mut self.cell.lock())
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.cell, &other.cell)
	}

	pub fn downgrade(&self) -> WeakInstanceHandle {
		WeakInstanceHandle {
			id: self.id,
			cell: Arc::downgrade(&self.cell),
		}
	}

	/// Takes the component object out of the record for a hook call.
	pub fn take_component(&self) -> Option<Box<dyn Component>> {
		self.cell.lock().component.take()
	}

	/// Returns the component object after a hook call.
	pub fn put_component(&self, component: Option<Box<dyn Component>>) {
		self.cell.lock().component = component;
	}

	/// Takes the pending class-initialized listeners; they fire once.
	pub fn drain_init_listeners(&self) -> Vec<InitListener> {
		std::mem::take(&mut self.cell.lock().init_listeners)
	}

	/// Clears element, template, child maps, services, and the component
	/// object. The record stays allocated for any remaining handles.
	pub fn clear(&self) {
		let mut instance = self.cell.lock();
		instance.element = None;
		instance.template = None;
		instance.children = IndexMap::new();
		instance.child_components = IndexMap::new();
		instance.services = Vec::new();
		instance.component = None;
		instance.init_listeners = Vec::new();
	}
}

impl std::fmt::Debug for InstanceHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let instance = self.cell.lock();
		f.debug_struct("InstanceHandle")
			.field("id", &self.id)
			.field("selector", &instance.selector)
			.field("identifier", &instance.identifier)
			.field("element", &instance.element)
			.finish()
	}
}

/// Weak counterpart of [`InstanceHandle`]; used by listeners that must not
/// keep a destroyed instance alive.
#[derive(Clone)]
pub struct WeakInstanceHandle {
	id: InstanceId,
	cell: Weak<Mutex<ComponentInstance>>,
}

impl WeakInstanceHandle {
	pub fn id(&self) -> InstanceId {
		self.id
	}

	pub fn upgrade(&self) -> Option<InstanceHandle> {
		self.cell.upgrade().map(|cell| InstanceHandle { id: self.id, cell })
	}
}
