//! Forgiving markup parsing and serialization.
//!
//! The parser accepts the subset of HTML the engine deals with: elements with
//! quoted, unquoted, or bare attributes, text, comments (dropped), void and
//! self-closing elements. It never fails; malformed input degrades to text or
//! is skipped.

use crate::node::{Node, NodeId, NodeKind, Tree};

const VOID_TAGS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
	"source", "track", "wbr",
];

fn is_void(tag: &str) -> bool {
	VOID_TAGS.contains(&tag)
}

/// Parses `input` into a list of detached top-level nodes.
pub(crate) fn parse_fragment(tree: &mut Tree, input: &str) -> Vec<NodeId> {
	let mut parser = Parser {
		input: input.as_bytes(),
		pos: 0,
	};
	let mut roots = Vec::new();
	// Open-element stack; `None` parent means top level.
	let mut stack: Vec<(NodeId, Box<str>)> = Vec::new();

	while let Some(piece) = parser.next_piece() {
		match piece {
			Piece::Text(text) => {
				if text.is_empty() {
					continue;
				}
				let id = tree.insert(Node::text(&text));
				attach(tree, &stack, &mut roots, id);
			}
			Piece::Open { tag, attrs, self_closing } => {
				let mut node = Node::element(&tag);
				if let NodeKind::Element { attrs: map, .. } = &mut node.kind {
					for (name, value) in attrs {
						map.insert(name.to_ascii_lowercase().into_boxed_str(), value);
					}
				}
				let tag = tag.to_ascii_lowercase().into_boxed_str();
				let id = tree.insert(node);
				attach(tree, &stack, &mut roots, id);
				if !self_closing && !is_void(&tag) {
					stack.push((id, tag));
				}
			}
			Piece::Close(tag) => {
				let tag = tag.to_ascii_lowercase();
				// Forgiving: pop through mismatched opens, ignore strays.
				if let Some(at) = stack.iter().rposition(|(_, open)| **open == *tag) {
					stack.truncate(at);
				}
			}
		}
	}
	roots
}

fn attach(tree: &mut Tree, stack: &[(NodeId, Box<str>)], roots: &mut Vec<NodeId>, id: NodeId) {
	match stack.last() {
		Some((parent, _)) => {
			tree.get_mut(id).parent = Some(*parent);
			tree.get_mut(*parent).children.push(id);
		}
		None => roots.push(id),
	}
}

enum Piece {
	Text(String),
	Open {
		tag: String,
		attrs: Vec<(String, String)>,
		self_closing: bool,
	},
	Close(String),
}

struct Parser<'a> {
	input: &'a [u8],
	pos: usize,
}

impl Parser<'_> {
	fn next_piece(&mut self) -> Option<Piece> {
		if self.pos >= self.input.len() {
			return None;
		}
		if self.peek() == b'<' {
			if self.rest().starts_with(b"<!--") {
				self.skip_comment();
				return self.next_piece();
			}
			if self.rest().starts_with(b"</") {
				return Some(self.parse_close());
			}
			if self.rest().len() > 1 && self.input[self.pos + 1].is_ascii_alphabetic() {
				return Some(self.parse_open());
			}
			// Lone '<': treat as text.
		}
		Some(Piece::Text(self.take_text()))
	}

	fn peek(&self) -> u8 {
		self.input[self.pos]
	}

	fn rest(&self) -> &[u8] {
		&self.input[self.pos..]
	}

	fn take_text(&mut self) -> String {
		let start = self.pos;
		self.pos += 1;
		while self.pos < self.input.len() && self.peek() != b'<' {
			self.pos += 1;
		}
		String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
	}

	fn skip_comment(&mut self) {
		self.pos += 4;
		while self.pos < self.input.len() && !self.rest().starts_with(b"-->") {
			self.pos += 1;
		}
		self.pos = (self.pos + 3).min(self.input.len());
	}

	fn parse_close(&mut self) -> Piece {
		self.pos += 2;
		let tag = self.take_name();
		while self.pos < self.input.len() && self.peek() != b'>' {
			self.pos += 1;
		}
		if self.pos < self.input.len() {
			self.pos += 1;
		}
		Piece::Close(tag)
	}

	fn parse_open(&mut self) -> Piece {
		self.pos += 1;
		let tag = self.take_name();
		let mut attrs = Vec::new();
		let mut self_closing = false;
		loop {
			self.skip_ws();
			if self.pos >= self.input.len() {
				break;
			}
			match self.peek() {
				b'>' => {
					self.pos += 1;
					break;
				}
				b'/' => {
					self.pos += 1;
					if self.pos < self.input.len() && self.peek() == b'>' {
						self.pos += 1;
						self_closing = true;
						break;
					}
				}
				_ => {
					let name = self.take_name();
					if name.is_empty() {
						// Unparseable garbage; skip one byte to make progress.
						self.pos += 1;
						continue;
					}
					self.skip_ws();
					let value = if self.pos < self.input.len() && self.peek() == b'=' {
						self.pos += 1;
						self.skip_ws();
						self.take_value()
					} else {
						String::new()
					};
					attrs.push((name, value));
				}
			}
		}
		Piece::Open { tag, attrs, self_closing }
	}

	fn take_name(&mut self) -> String {
		let start = self.pos;
		while self.pos < self.input.len()
			&& matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b':')
		{
			self.pos += 1;
		}
		String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
	}

	fn take_value(&mut self) -> String {
		if self.pos >= self.input.len() {
			return String::new();
		}
		match self.peek() {
			quote @ (b'"' | b'\'') => {
				self.pos += 1;
				let start = self.pos;
				while self.pos < self.input.len() && self.peek() != quote {
					self.pos += 1;
				}
				let value = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
				if self.pos < self.input.len() {
					self.pos += 1;
				}
				value
			}
			_ => {
				let start = self.pos;
				while self.pos < self.input.len()
					&& !self.peek().is_ascii_whitespace()
					&& self.peek() != b'>'
				{
					self.pos += 1;
				}
				String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
			}
		}
	}

	fn skip_ws(&mut self) {
		while self.pos < self.input.len() && self.peek().is_ascii_whitespace() {
			self.pos += 1;
		}
	}
}

/// Serializes the children of `node` back to markup.
pub(crate) fn serialize_children(tree: &Tree, node: NodeId) -> String {
	let mut out = String::new();
	for &child in &tree.get(node).children {
		serialize_node(tree, child, &mut out);
	}
	out
}

fn serialize_node(tree: &Tree, id: NodeId, out: &mut String) {
	let node = tree.get(id);
	match &node.kind {
		NodeKind::Text(text) => out.push_str(text),
		NodeKind::Element { tag, attrs } => {
			out.push('<');
			out.push_str(tag);
			for (name, value) in attrs {
				out.push(' ');
				out.push_str(name);
				if !value.is_empty() {
					out.push_str("=\"");
					out.push_str(value);
					out.push('"');
				}
			}
			out.push('>');
			if is_void(tag) {
				return;
			}
			for &child in &node.children {
				serialize_node(tree, child, out);
			}
			out.push_str("</");
			out.push_str(tag);
			out.push('>');
		}
	}
}
