use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use weft_dom::{Document, Mutation, NodeId};
use weft_registry::{
	ComponentDef, DefinitionTable, InstanceHandle, InstanceRegistry, Service, ServiceRegistry,
};

use crate::fetch::{HttpTemplateFetcher, TemplateFetcher};
use crate::overlay::RouteOverlay;
use crate::template::TemplateCache;
use crate::{orchestrator, watcher};

/// Shared state behind one engine: the document plus every table the
/// pipeline reads or writes. Fetch continuations and the mutation watcher
/// hold this weakly so dropping the [`Engine`] retires them.
pub(crate) struct Core {
	pub doc: Document,
	pub defs: DefinitionTable,
	pub services: ServiceRegistry,
	pub instances: InstanceRegistry,
	pub templates: TemplateCache,
	pub fetcher: Arc<dyn TemplateFetcher>,
	pub overlay: RwLock<Option<Arc<dyn RouteOverlay>>>,
	watcher_installed: AtomicBool,
}

/// Configures an [`Engine`] before it starts observing the document.
pub struct EngineBuilder {
	doc: Document,
	fetcher: Option<Arc<dyn TemplateFetcher>>,
	overlay: Option<Arc<dyn RouteOverlay>>,
}

impl EngineBuilder {
	/// Replaces the default HTTP template fetcher.
	pub fn fetcher(mut self, fetcher: Arc<dyn TemplateFetcher>) -> Self {
		self.fetcher = Some(fetcher);
		self
	}

	pub fn overlay(mut self, overlay: Arc<dyn RouteOverlay>) -> Self {
		self.overlay = Some(overlay);
		self
	}

	pub fn build(self) -> Engine {
		Engine {
			core: Arc::new(Core {
				doc: self.doc,
				defs: DefinitionTable::new(),
				services: ServiceRegistry::new(),
				instances: InstanceRegistry::new(),
				templates: TemplateCache::new(),
				fetcher: self
					.fetcher
					.unwrap_or_else(|| Arc::new(HttpTemplateFetcher::new())),
				overlay: RwLock::new(self.overlay),
				watcher_installed: AtomicBool::new(false),
			}),
		}
	}
}

/// The component lifecycle engine over one document.
///
/// All state is owned by the engine instance; two engines over two documents
/// are fully isolated. The mutation watcher is installed lazily by the first
/// registration call.
pub struct Engine {
	core: Arc<Core>,
}

impl Engine {
	pub fn new(doc: Document) -> Self {
		Self::builder(doc).build()
	}

	pub fn builder(doc: Document) -> EngineBuilder {
		EngineBuilder {
			doc,
			fetcher: None,
			overlay: None,
		}
	}

	pub fn document(&self) -> &Document {
		&self.core.doc
	}

	pub fn definitions(&self) -> &DefinitionTable {
		&self.core.defs
	}

	pub fn instances(&self) -> &InstanceRegistry {
		&self.core.instances
	}

	pub fn services(&self) -> &ServiceRegistry {
		&self.core.services
	}

	pub fn templates(&self) -> &TemplateCache {
		&self.core.templates
	}

	/// Installs (or replaces) the route overlay consulted on added subtrees.
	pub fn set_overlay(&self, overlay: Arc<dyn RouteOverlay>) {
		*self.core.overlay.write() = Some(overlay);
	}

	/// Registers resolved service values under opaque tokens.
	pub fn register_services<I, S>(&self, services: I)
	where
		I: IntoIterator<Item = (S, Service)>,
		S: Into<String>,
	{
		for (token, value) in services {
			self.core.services.insert(token, value);
		}
	}

	/// Registers definitions and scans `root` (the document root when `None`)
	/// once the document is ready. Idempotent per element through the
	/// pipeline's dedup check.
	pub fn register_components(&self, defs: Vec<ComponentDef>, root: Option<NodeId>) {
		self.register_and_scan(defs, root, false);
	}

	/// Like [`Engine::register_components`], but additionally skips elements
	/// that a previous scan already bound for the same selector.
	pub fn register_components_once(&self, defs: Vec<ComponentDef>, root: Option<NodeId>) {
		self.register_and_scan(defs, root, true);
	}

	fn register_and_scan(&self, defs: Vec<ComponentDef>, root: Option<NodeId>, once: bool) {
		self.install_watcher();

		// Register first so nested child resolution can see every definition,
		// then scan with the stored entries (first registration wins).
		let mut stored = Vec::with_capacity(defs.len());
		for def in defs {
			let selector = def.selector.clone();
			self.core.defs.insert(def);
			if let Some(def) = self.core.defs.get(&selector) {
				stored.push(def);
			}
		}

		let root = root.unwrap_or_else(|| self.core.doc.root());
		let weak = Arc::downgrade(&self.core);
		self.core.doc.on_ready(move || {
			let Some(core) = weak.upgrade() else {
				return;
			};
			for def in stored {
				let elements = core.doc.query_all_by_attr(root, &def.selector, None);
				for element in elements {
					if once
						&& core
							.instances
							.lookup_by_selector(&def.selector)
							.iter()
							.any(|i| i.element() == Some(element))
					{
						continue;
					}
					orchestrator::create_for_element(&core, &def, element);
				}
			}
		});
	}

	/// Runs one element through the full single-instance pipeline, for
	/// externally supplied markup (e.g. fragments from a network response).
	/// Returns `None` if no definition is registered for `selector`.
	pub fn create_component_with_element(
		&self,
		element: NodeId,
		selector: &str,
	) -> Option<InstanceHandle> {
		let def = self.core.defs.get(selector)?;
		Some(orchestrator::create_for_element(&self.core, &def, element))
	}

	/// Feeds synthetic subtree change records through the mutation watcher,
	/// exactly as if the document had delivered them.
	pub fn process_mutations(&self, batch: &[Mutation]) {
		watcher::process(&self.core, batch);
	}

	fn install_watcher(&self) {
		if self.core.watcher_installed.swap(true, Ordering::SeqCst) {
			return;
		}
		let weak = Arc::downgrade(&self.core);
		self.core.doc.observe(move |batch| {
			if let Some(core) = weak.upgrade() {
				watcher::process(&core, batch);
			}
		});
	}
}
