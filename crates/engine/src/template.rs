use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

/// Per-element override attribute naming a remote template URL. Takes
/// precedence over the definition's own template specification.
pub const TEMPLATE_SOURCE_ATTR: &str = "template-source";

/// URL → previously fetched template text. Consulted before issuing a fetch
/// for definitions with remote caching enabled; a hit resolves the template
/// synchronously.
#[derive(Default)]
pub struct TemplateCache {
	inner: Mutex<HashMap<Box<str>, String>>,
}

impl TemplateCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, url: &str) -> Option<String> {
		self.inner.lock().get(url).cloned()
	}

	pub fn insert(&self, url: &str, text: &str) {
		self.inner.lock().insert(Box::from(url), text.to_string());
	}

	pub fn len(&self) -> usize {
		self.inner.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.lock().is_empty()
	}
}
