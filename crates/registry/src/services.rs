use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use crate::component::Service;

/// Injection token → resolved service value. Tokens are opaque strings;
/// lookup is synchronous and missing tokens resolve to `None`.
#[derive(Default)]
pub struct ServiceRegistry {
	inner: Mutex<HashMap<Box<str>, Service>>,
}

impl ServiceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, token: impl Into<String>, value: Service) {
		self.inner.lock().insert(token.into().into_boxed_str(), value);
	}

	pub fn get(&self, token: &str) -> Option<Service> {
		self.inner.lock().get(token).cloned()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[test]
	fn stores_and_downcasts() {
		let services = ServiceRegistry::new();
		services.insert("config.title", Arc::new("hello".to_string()));

		let value = services.get("config.title").unwrap();
		assert_eq!(value.downcast_ref::<String>().unwrap(), "hello");
		assert!(services.get("missing").is_none());
	}

	#[test]
	fn later_insert_replaces() {
		let services = ServiceRegistry::new();
		services.insert("n", Arc::new(1u32));
		services.insert("n", Arc::new(2u32));
		let value = services.get("n").unwrap();
		assert_eq!(*value.downcast_ref::<u32>().unwrap(), 2);
	}
}
