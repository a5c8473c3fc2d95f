use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::markup;
use crate::node::{Node, NodeId, NodeKind, Tree};
use crate::select;

/// One subtree change record: nodes whose subtrees entered or left the
/// document. Mirrors the shape of a host child-list mutation record.
#[derive(Debug, Default, Clone)]
pub struct Mutation {
	pub added: Vec<NodeId>,
	pub removed: Vec<NodeId>,
}

impl Mutation {
	pub fn added(nodes: Vec<NodeId>) -> Self {
		Self { added: nodes, removed: Vec::new() }
	}

	pub fn removed(nodes: Vec<NodeId>) -> Self {
		Self { added: Vec::new(), removed: nodes }
	}
}

type MutationCallback = Arc<dyn Fn(&[Mutation]) + Send + Sync>;
type ResizeCallback = Box<dyn FnMut() + Send>;
type ReadyCallback = Box<dyn FnOnce() + Send>;

struct ReadyState {
	ready: bool,
	queued: Vec<ReadyCallback>,
}

struct DocShared {
	tree: Mutex<Tree>,
	observers: Mutex<Vec<MutationCallback>>,
	resize: Mutex<Vec<ResizeCallback>>,
	ready: Mutex<ReadyState>,
}

/// A shared handle to one document tree.
///
/// Cloning is cheap and every clone refers to the same tree. All locking is
/// internal and per-call; observer, ready, and resize callbacks are always
/// invoked with no internal lock held, so they may freely query and mutate
/// the document.
#[derive(Clone)]
pub struct Document {
	shared: Arc<DocShared>,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// Creates a document that is immediately ready for querying.
	pub fn new() -> Self {
		Self::with_ready(true)
	}

	/// Creates a document that is still loading; deferred work queued via
	/// [`Document::on_ready`] runs once [`Document::set_ready`] is called.
	pub fn new_loading() -> Self {
		Self::with_ready(false)
	}

	fn with_ready(ready: bool) -> Self {
		Self {
			shared: Arc::new(DocShared {
				tree: Mutex::new(Tree::new()),
				observers: Mutex::new(Vec::new()),
				resize: Mutex::new(Vec::new()),
				ready: Mutex::new(ReadyState { ready, queued: Vec::new() }),
			}),
		}
	}

	/// The root element (`body`).
	pub fn root(&self) -> NodeId {
		self.shared.tree.lock().root
	}

	// -- node construction ---------------------------------------------------

	/// Creates a detached element.
	pub fn create_element(&self, tag: &str) -> NodeId {
		self.shared.tree.lock().insert(Node::element(tag))
	}

	/// Creates a detached text node.
	pub fn create_text(&self, text: &str) -> NodeId {
		self.shared.tree.lock().insert(Node::text(text))
	}

	/// Parses `markup` into a list of detached top-level nodes.
	pub fn create_fragment(&self, markup: &str) -> Vec<NodeId> {
		markup::parse_fragment(&mut self.shared.tree.lock(), markup)
	}

	/// Deep-copies a subtree; the copy is detached.
	pub fn clone_subtree(&self, node: NodeId) -> NodeId {
		self.shared.tree.lock().clone_subtree(node)
	}

	// -- structural edits ----------------------------------------------------

	/// Appends `child` under `parent`, detaching it from any previous parent.
	///
	/// Observers are notified with one added record only when the subtree
	/// actually enters the document; assembling detached fragments is silent,
	/// mirroring an observer rooted at the document body.
	pub fn append_child(&self, parent: NodeId, child: NodeId) {
		let entered = {
			let mut tree = self.shared.tree.lock();
			tree.detach(child);
			tree.get_mut(child).parent = Some(parent);
			tree.get_mut(parent).children.push(child);
			let connected = tree.get(parent).connected;
			tree.set_connected(child, connected);
			connected
		};
		if entered {
			self.notify(vec![Mutation::added(vec![child])]);
		}
	}

	/// Detaches `node` from its parent. Observers are notified with one
	/// removed record only when the subtree actually leaves the document.
	/// The subtree stays readable after removal.
	pub fn remove(&self, node: NodeId) {
		let left = {
			let mut tree = self.shared.tree.lock();
			let was_connected = tree.get(node).connected;
			tree.detach(node);
			tree.set_connected(node, false);
			was_connected
		};
		if left {
			self.notify(vec![Mutation::removed(vec![node])]);
		}
	}

	// -- node inspection -----------------------------------------------------

	pub fn is_element(&self, node: NodeId) -> bool {
		self.shared.tree.lock().get(node).is_element()
	}

	pub fn tag(&self, node: NodeId) -> Option<String> {
		match &self.shared.tree.lock().get(node).kind {
			NodeKind::Element { tag, .. } => Some(tag.to_string()),
			NodeKind::Text(_) => None,
		}
	}

	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.shared.tree.lock().get(node).parent
	}

	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.shared.tree.lock().get(node).children.clone()
	}

	/// True while the node is reachable from the document root.
	pub fn is_connected(&self, node: NodeId) -> bool {
		self.shared.tree.lock().get(node).connected
	}

	// -- attributes ----------------------------------------------------------

	pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
		match &self.shared.tree.lock().get(node).kind {
			NodeKind::Element { attrs, .. } => attrs.get(name).cloned(),
			NodeKind::Text(_) => None,
		}
	}

	pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
		match &self.shared.tree.lock().get(node).kind {
			NodeKind::Element { attrs, .. } => attrs.contains_key(name),
			NodeKind::Text(_) => false,
		}
	}

	pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
		if let NodeKind::Element { attrs, .. } = &mut self.shared.tree.lock().get_mut(node).kind {
			attrs.insert(Box::from(name), value.to_string());
		}
	}

	pub fn remove_attr(&self, node: NodeId, name: &str) {
		if let NodeKind::Element { attrs, .. } = &mut self.shared.tree.lock().get_mut(node).kind {
			attrs.shift_remove(name);
		}
	}

	// -- selector-attribute convention ---------------------------------------

	/// True if the element carries the selector attribute, as either the
	/// plain name or the `data-` variant, optionally with an exact value.
	pub fn has_selector(&self, node: NodeId, selector: &str, value: Option<&str>) -> bool {
		let tree = self.shared.tree.lock();
		element_has_selector(tree.get(node), selector, value)
	}

	/// Reads the value of the selector attribute, trying the plain name then
	/// the `data-` variant. Empty values count as absent.
	pub fn selector_value(&self, node: NodeId, selector: &str) -> Option<String> {
		let cleared = selector.strip_prefix("data-").unwrap_or(selector);
		let tree = self.shared.tree.lock();
		let NodeKind::Element { attrs, .. } = &tree.get(node).kind else {
			return None;
		};
		attrs
			.get(cleared)
			.filter(|v| !v.is_empty())
			.or_else(|| attrs.get(format!("data-{cleared}").as_str()).filter(|v| !v.is_empty()))
			.cloned()
	}

	/// All descendants of `root` (excluding `root` itself, in document order)
	/// carrying the selector attribute, optionally with an exact value.
	pub fn query_all_by_attr(
		&self,
		root: NodeId,
		selector: &str,
		value: Option<&str>,
	) -> Vec<NodeId> {
		let tree = self.shared.tree.lock();
		let mut all = Vec::new();
		tree.collect_descendants(root, &mut all);
		all.retain(|id| element_has_selector(tree.get(*id), selector, value));
		all
	}

	// -- lookups -------------------------------------------------------------

	/// First connected element whose `id` attribute equals `id`.
	pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
		let tree = self.shared.tree.lock();
		let mut all = vec![tree.root];
		tree.collect_descendants(tree.root, &mut all);
		all.into_iter().find(|n| {
			matches!(&tree.get(*n).kind, NodeKind::Element { attrs, .. } if attrs.get("id").map(String::as_str) == Some(id))
		})
	}

	/// First descendant of `node` with the given tag, in document order.
	pub fn first_child_with_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
		let tree = self.shared.tree.lock();
		let mut all = Vec::new();
		tree.collect_descendants(node, &mut all);
		all.into_iter().find(|n| {
			matches!(&tree.get(*n).kind, NodeKind::Element { tag: t, .. } if t.as_ref() == tag)
		})
	}

	// -- simple-selector matching --------------------------------------------

	/// Tests `node` against a simple selector (see [`crate`] docs for the
	/// supported grammar). Text nodes never match.
	pub fn matches(&self, node: NodeId, selector: &str) -> bool {
		let tree = self.shared.tree.lock();
		match &tree.get(node).kind {
			NodeKind::Element { tag, attrs } => select::element_matches(tag, attrs, selector),
			NodeKind::Text(_) => false,
		}
	}

	/// All descendants of `root` matching a simple selector.
	pub fn query_all_matching(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
		let tree = self.shared.tree.lock();
		let mut all = Vec::new();
		tree.collect_descendants(root, &mut all);
		all.retain(|id| match &tree.get(*id).kind {
			NodeKind::Element { tag, attrs } => select::element_matches(tag, attrs, selector),
			NodeKind::Text(_) => false,
		});
		all
	}

	// -- content -------------------------------------------------------------

	/// Replaces the children of `node` with a fragment parsed from `markup`.
	///
	/// Content replacement is a render-time operation, not a structural edit
	/// by the embedder, so no mutation records are delivered. The previous
	/// children are detached, not freed: ids held elsewhere stay valid and
	/// the displaced subtrees stay readable, like removed ones.
	pub fn set_inner_markup(&self, node: NodeId, markup_text: &str) {
		let mut tree = self.shared.tree.lock();
		let old = mem::take(&mut tree.get_mut(node).children);
		for child in old {
			tree.get_mut(child).parent = None;
			tree.set_connected(child, false);
		}
		let roots = markup::parse_fragment(&mut tree, markup_text);
		let connected = tree.get(node).connected;
		for root in roots {
			tree.get_mut(root).parent = Some(node);
			tree.get_mut(node).children.push(root);
			tree.set_connected(root, connected);
		}
	}

	/// Serializes the children of `node` back to markup.
	pub fn inner_markup(&self, node: NodeId) -> String {
		markup::serialize_children(&self.shared.tree.lock(), node)
	}

	// -- subtree change notification -----------------------------------------

	/// Registers a subtree-change observer. Observers receive each batch in
	/// delivery order and are never unregistered.
	pub fn observe(&self, callback: impl Fn(&[Mutation]) + Send + Sync + 'static) {
		self.shared.observers.lock().push(Arc::new(callback));
	}

	fn notify(&self, batch: Vec<Mutation>) {
		let observers = self.shared.observers.lock().clone();
		for observer in observers {
			observer(&batch);
		}
	}

	// -- readiness -----------------------------------------------------------

	pub fn is_ready(&self) -> bool {
		self.shared.ready.lock().ready
	}

	/// Runs `callback` now if the document is ready, otherwise queues it for
	/// [`Document::set_ready`].
	pub fn on_ready(&self, callback: impl FnOnce() + Send + 'static) {
		{
			let mut state = self.shared.ready.lock();
			if !state.ready {
				state.queued.push(Box::new(callback));
				return;
			}
		}
		callback();
	}

	/// Marks the document ready and drains queued callbacks in registration
	/// order. Idempotent.
	pub fn set_ready(&self) {
		loop {
			let queued = {
				let mut state = self.shared.ready.lock();
				state.ready = true;
				mem::take(&mut state.queued)
			};
			if queued.is_empty() {
				return;
			}
			for callback in queued {
				callback();
			}
		}
	}

	// -- resize hub ----------------------------------------------------------

	/// Registers a window-resize listener. Listeners are kept for the
	/// document's lifetime; there is no removal.
	pub fn add_resize_listener(&self, callback: impl FnMut() + Send + 'static) {
		self.shared.resize.lock().push(Box::new(callback));
	}

	/// Delivers a resize event to every registered listener.
	pub fn emit_resize(&self) {
		let mut listeners = mem::take(&mut *self.shared.resize.lock());
		for listener in &mut listeners {
			listener();
		}
		// Listeners registered during dispatch land after the existing ones.
		let mut slot = self.shared.resize.lock();
		let added_during = mem::take(&mut *slot);
		*slot = listeners;
		slot.extend(added_during);
	}
}

fn element_has_selector(node: &Node, selector: &str, value: Option<&str>) -> bool {
	let NodeKind::Element { attrs, .. } = &node.kind else {
		return false;
	};
	let data = format!("data-{selector}");
	match value {
		None => attrs.contains_key(selector) || attrs.contains_key(data.as_str()),
		Some(want) => {
			attrs.get(selector).map(String::as_str) == Some(want)
				|| attrs.get(data.as_str()).map(String::as_str) == Some(want)
		}
	}
}
