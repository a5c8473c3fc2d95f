use indexmap::IndexMap;
use slab::Slab;

/// Non-owning handle to a node in a [`Document`](crate::Document) arena.
///
/// Handles stay valid for the document's lifetime: detachment (removal or
/// content replacement) never frees a node's slot, so a stale id always
/// refers to the node it was created for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) usize);

pub(crate) enum NodeKind {
	Element {
		tag: Box<str>,
		/// Attribute order is preserved for serialization.
		attrs: IndexMap<Box<str>, String>,
	},
	Text(String),
}

pub(crate) struct Node {
	pub kind: NodeKind,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
	/// True while the node is reachable from the document root.
	pub connected: bool,
}

impl Node {
	pub fn element(tag: &str) -> Self {
		Self {
			kind: NodeKind::Element {
				tag: tag.to_ascii_lowercase().into_boxed_str(),
				attrs: IndexMap::new(),
			},
			parent: None,
			children: Vec::new(),
			connected: false,
		}
	}

	pub fn text(text: &str) -> Self {
		Self {
			kind: NodeKind::Text(text.to_string()),
			parent: None,
			children: Vec::new(),
			connected: false,
		}
	}

	pub fn is_element(&self) -> bool {
		matches!(self.kind, NodeKind::Element { .. })
	}
}

/// The raw tree: a slab arena plus the root id.
pub(crate) struct Tree {
	pub nodes: Slab<Node>,
	pub root: NodeId,
}

impl Tree {
	pub fn new() -> Self {
		let mut nodes = Slab::new();
		let mut body = Node::element("body");
		body.connected = true;
		let root = NodeId(nodes.insert(body));
		Self { nodes, root }
	}

	pub fn get(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
		&mut self.nodes[id.0]
	}

	pub fn insert(&mut self, node: Node) -> NodeId {
		NodeId(self.nodes.insert(node))
	}

	/// Detaches `id` from its parent, if it has one.
	pub fn detach(&mut self, id: NodeId) {
		if let Some(parent) = self.get(id).parent {
			self.get_mut(parent).children.retain(|c| *c != id);
			self.get_mut(id).parent = None;
		}
	}

	/// Sets the `connected` flag on `id` and all descendants.
	pub fn set_connected(&mut self, id: NodeId, connected: bool) {
		self.get_mut(id).connected = connected;
		let children = self.get(id).children.clone();
		for child in children {
			self.set_connected(child, connected);
		}
	}

	/// Appends descendants of `root` (excluding `root`) in document order.
	pub fn collect_descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
		for &child in &self.get(root).children {
			out.push(child);
			self.collect_descendants(child, out);
		}
	}

	pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
		let (kind, children) = {
			let node = self.get(id);
			let kind = match &node.kind {
				NodeKind::Element { tag, attrs } => NodeKind::Element {
					tag: tag.clone(),
					attrs: attrs.clone(),
				},
				NodeKind::Text(text) => NodeKind::Text(text.clone()),
			};
			(kind, node.children.clone())
		};
		let copy = self.insert(Node {
			kind,
			parent: None,
			children: Vec::new(),
			connected: false,
		});
		for child in children {
			let child_copy = self.clone_subtree(child);
			self.get_mut(child_copy).parent = Some(copy);
			self.get_mut(copy).children.push(child_copy);
		}
		copy
	}
}
