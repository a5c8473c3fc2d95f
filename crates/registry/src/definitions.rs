use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::def::ComponentDef;

/// Selector → definition table. Populated by registration calls; entries are
/// never removed.
///
/// Duplicate policy: the first registration per selector wins and later ones
/// are ignored with a debug log. Lookup is O(1); iteration follows insertion
/// order so scans and the mutation watcher visit selectors deterministically.
#[derive(Default)]
pub struct DefinitionTable {
	inner: RwLock<IndexMap<Box<str>, Arc<ComponentDef>>>,
}

impl DefinitionTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `def` keyed by its selector. Returns false (and keeps the
	/// existing entry) if the selector is already registered.
	pub fn insert(&self, def: ComponentDef) -> bool {
		let mut inner = self.inner.write();
		if inner.contains_key(def.selector.as_str()) {
			debug!(selector = %def.selector, "duplicate definition ignored");
			return false;
		}
		inner.insert(def.selector.clone().into_boxed_str(), Arc::new(def));
		true
	}

	pub fn get(&self, selector: &str) -> Option<Arc<ComponentDef>> {
		self.inner.read().get(selector).cloned()
	}

	/// Registered selectors, in insertion order.
	pub fn selectors(&self) -> Vec<String> {
		self.inner.read().keys().map(|k| k.to_string()).collect()
	}

	pub fn len(&self) -> usize {
		self.inner.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}
}
