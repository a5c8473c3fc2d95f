use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;
use tracing::trace;
use weft_dom::{Document, NodeId};

use crate::instance::{InstanceHandle, InstanceId};

/// Marker attribute set on every bound element, letting scans and
/// removal-time descendant searches recognize processed nodes without a
/// registry lookup.
pub const LINKED_ATTR: &str = "weft-linked";

/// The authoritative index of live element↔component relationships.
///
/// Two co-maintained indices: element → instances attached to it (an element
/// may host several components of distinct selectors), and selector →
/// instances of that kind. Lookups for unknown keys yield empty vectors,
/// never errors.
#[derive(Default)]
pub struct InstanceRegistry {
	by_element: Mutex<HashMap<NodeId, Vec<InstanceHandle>>>,
	by_selector: Mutex<HashMap<Box<str>, Vec<InstanceHandle>>>,
}

impl InstanceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `handle` to the element's instance list and tags the element
	/// with [`LINKED_ATTR`].
	pub fn index_element(&self, doc: &Document, element: NodeId, handle: &InstanceHandle) {
		self.by_element.lock().entry(element).or_default().push(handle.clone());
		doc.set_attr(element, LINKED_ATTR, "");
	}

	pub fn lookup_by_element(&self, element: NodeId) -> Vec<InstanceHandle> {
		self.by_element.lock().get(&element).cloned().unwrap_or_default()
	}

	/// Commits `handle` to the selector index (the pipeline's terminal step).
	pub fn index_selector(&self, selector: &str, handle: &InstanceHandle) {
		self.by_selector
			.lock()
			.entry(Box::from(selector))
			.or_default()
			.push(handle.clone());
	}

	pub fn lookup_by_selector(&self, selector: &str) -> Vec<InstanceHandle> {
		self.by_selector.lock().get(selector).cloned().unwrap_or_default()
	}

	/// Instances of `selector` whose identifier equals `identifier`.
	pub fn lookup_by_selector_and_identifier(
		&self,
		selector: &str,
		identifier: &str,
	) -> Vec<InstanceHandle> {
		let mut instances = self.lookup_by_selector(selector);
		instances.retain(|i| i.identifier().as_deref() == Some(identifier));
		instances
	}

	/// Removes and returns the element's instance list for teardown, purging
	/// the returned handles from the selector index as well.
	pub fn unindex(&self, element: NodeId) -> Vec<InstanceHandle> {
		let Some(instances) = self.by_element.lock().remove(&element) else {
			return Vec::new();
		};
		self.purge_from_selector_index(&instances);
		trace!(?element, count = instances.len(), "unindexed element");
		instances
	}

	/// Removes one instance from the element index (and the selector index,
	/// if it was already committed). Returns true if it was found. Used to
	/// unwind a partial binding after a failed template fetch.
	pub fn unbind(&self, element: NodeId, id: InstanceId) -> bool {
		let removed = {
			let mut by_element = self.by_element.lock();
			let Some(list) = by_element.get_mut(&element) else {
				return false;
			};
			let before = list.len();
			let removed: Vec<InstanceHandle> =
				list.extract_if(.., |i| i.id() == id).collect();
			if list.is_empty() && before > 0 {
				by_element.remove(&element);
			}
			removed
		};
		if removed.is_empty() {
			return false;
		}
		self.purge_from_selector_index(&removed);
		true
	}

	fn purge_from_selector_index(&self, gone: &[InstanceHandle]) {
		let mut by_selector = self.by_selector.lock();
		for handle in gone {
			if let Some(list) = by_selector.get_mut(handle.selector().as_str()) {
				list.retain(|i| i.id() != handle.id());
			}
		}
	}
}
