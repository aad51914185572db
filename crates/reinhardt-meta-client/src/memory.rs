//! In-memory document.
//!
//! An arena of element nodes addressed by [`NodeId`]. It backs the
//! reconciler natively, in tests and in non-browser hosts, and keeps enough
//! structure (parents, children, load state) to observe every mutation.

use crate::dom::{DomTarget, LoadListener, MetaDom};
use std::fmt;

/// Handle to a node of a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// The document node every connected element descends from.
const DOCUMENT: NodeId = NodeId(0);

struct NodeData {
	tag_name: String,
	attributes: Vec<(String, String)>,
	content: String,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	loaded: bool,
	listeners: Vec<LoadListener>,
}

impl NodeData {
	fn new(tag_name: &str) -> Self {
		Self {
			tag_name: tag_name.to_ascii_lowercase(),
			attributes: Vec::new(),
			content: String::new(),
			parent: None,
			children: Vec::new(),
			loaded: false,
			listeners: Vec::new(),
		}
	}
}

/// An in-memory HTML document.
pub struct MemoryDocument {
	nodes: Vec<NodeData>,
	title: String,
}

impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDocument {
	/// A document with `<html>`, `<head>` and `<body>`.
	pub fn new() -> Self {
		Self::with_targets(&DomTarget::ALL)
	}

	/// A document holding only the given targets, for hosts with unusual shells.
	pub fn with_targets(targets: &[DomTarget]) -> Self {
		let mut doc = Self {
			nodes: vec![NodeData::new("#document")],
			title: String::new(),
		};
		let html = doc.alloc("html");
		doc.attach(DOCUMENT, html, false);
		for target in [DomTarget::Head, DomTarget::Body] {
			if targets.contains(&target) {
				let node = doc.alloc(target.tag_name());
				doc.attach(html, node, false);
			}
		}
		if !targets.contains(&DomTarget::Html) {
			doc.detach(html);
		}
		doc
	}

	/// Appends an element with attributes and content to `parent`.
	///
	/// Used to lay out a server-rendered document before the first cycle.
	pub fn append_element(
		&mut self,
		parent: NodeId,
		tag_name: &str,
		attributes: &[(&str, &str)],
		content: &str,
	) -> NodeId {
		let node = self.alloc(tag_name);
		for (name, value) in attributes {
			self.set_attribute(&node, name, value);
		}
		self.nodes[node.0].content = content.to_string();
		self.attach(parent, node, false);
		node
	}

	/// Fires the load event of `node`, running its listeners once.
	pub fn fire_load(&mut self, node: NodeId) {
		let Some(data) = self.nodes.get_mut(node.0) else {
			return;
		};
		data.loaded = true;
		let listeners = std::mem::take(&mut data.listeners);
		for listener in listeners {
			listener();
		}
	}

	/// Number of listeners waiting on `node`.
	pub fn pending_listeners(&self, node: NodeId) -> usize {
		self.nodes.get(node.0).map_or(0, |data| data.listeners.len())
	}

	/// Connected elements named `tag_name`, in document order.
	pub fn query(&self, tag_name: &str) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack = vec![DOCUMENT];
		while let Some(id) = stack.pop() {
			if self.nodes[id.0].tag_name.eq_ignore_ascii_case(tag_name) {
				out.push(id);
			}
			stack.extend(self.nodes[id.0].children.iter().rev());
		}
		out
	}

	/// Serializes `node` and its subtree. Nothing is escaped.
	pub fn outer_html(&self, node: NodeId) -> String {
		let data = &self.nodes[node.0];
		let mut out = format!("<{}", data.tag_name);
		for (name, value) in &data.attributes {
			if value.is_empty() {
				out.push_str(&format!(" {}", name));
			} else {
				out.push_str(&format!(" {}=\"{}\"", name, value));
			}
		}
		out.push('>');
		if matches!(data.tag_name.as_str(), "base" | "meta" | "link") {
			return out;
		}
		out.push_str(&data.content);
		for child in &data.children {
			out.push_str(&self.outer_html(*child));
		}
		out.push_str(&format!("</{}>", data.tag_name));
		out
	}

	/// Serializes the children of a target.
	pub fn inner_html(&self, target: DomTarget) -> String {
		self.target(target)
			.map(|node| {
				self.nodes[node.0]
					.children
					.iter()
					.map(|child| self.outer_html(*child))
					.collect()
			})
			.unwrap_or_default()
	}

	fn alloc(&mut self, tag_name: &str) -> NodeId {
		self.nodes.push(NodeData::new(tag_name));
		NodeId(self.nodes.len() - 1)
	}

	fn attach(&mut self, parent: NodeId, child: NodeId, front: bool) {
		self.detach(child);
		let siblings = &mut self.nodes[parent.0].children;
		if front {
			siblings.insert(0, child);
		} else {
			siblings.push(child);
		}
		self.nodes[child.0].parent = Some(parent);
	}

	fn detach(&mut self, child: NodeId) {
		if let Some(parent) = self.nodes[child.0].parent.take() {
			self.nodes[parent.0].children.retain(|id| *id != child);
		}
	}
}

impl MetaDom for MemoryDocument {
	type Node = NodeId;

	fn target(&self, target: DomTarget) -> Option<NodeId> {
		let html = self.nodes[DOCUMENT.0]
			.children
			.iter()
			.copied()
			.find(|id| self.nodes[id.0].tag_name == "html");
		match target {
			DomTarget::Html => html,
			_ => html.and_then(|html| {
				self.nodes[html.0]
					.children
					.iter()
					.copied()
					.find(|id| self.nodes[id.0].tag_name == target.tag_name())
			}),
		}
	}

	fn title(&self) -> String {
		self.title.clone()
	}

	fn set_title(&mut self, title: &str) {
		self.title = title.to_string();
	}

	fn create_element(&mut self, tag_name: &str) -> Option<NodeId> {
		Some(self.alloc(tag_name))
	}

	fn tag_name(&self, node: &NodeId) -> String {
		self.nodes[node.0].tag_name.clone()
	}

	fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
		self.nodes[node.0].attributes.clone()
	}

	fn get_attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		self.nodes[node.0]
			.attributes
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.clone())
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		let attributes = &mut self.nodes[node.0].attributes;
		match attributes.iter_mut().find(|(key, _)| key == name) {
			Some(entry) => entry.1 = value.to_string(),
			None => attributes.push((name.to_string(), value.to_string())),
		}
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		self.nodes[node.0].attributes.retain(|(key, _)| key != name);
	}

	fn content(&self, node: &NodeId) -> String {
		self.nodes[node.0].content.clone()
	}

	fn set_content(&mut self, node: &NodeId, content: &str) {
		self.nodes[node.0].content = content.to_string();
	}

	fn children(&self, parent: &NodeId) -> Vec<NodeId> {
		self.nodes[parent.0].children.clone()
	}

	fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
		self.attach(*parent, *child, false);
	}

	fn prepend_child(&mut self, parent: &NodeId, child: &NodeId) {
		self.attach(*parent, *child, true);
	}

	fn remove_node(&mut self, node: &NodeId) {
		self.detach(*node);
	}

	fn is_connected(&self, node: &NodeId) -> bool {
		let mut current = Some(*node);
		while let Some(id) = current {
			if id == DOCUMENT {
				return true;
			}
			current = self.nodes.get(id.0).and_then(|data| data.parent);
		}
		false
	}

	fn is_loaded(&self, node: &NodeId) -> bool {
		self.nodes.get(node.0).is_some_and(|data| data.loaded)
	}

	fn add_load_listener(&mut self, node: &NodeId, listener: LoadListener) {
		if let Some(data) = self.nodes.get_mut(node.0) {
			data.listeners.push(listener);
		}
	}
}

impl fmt::Debug for MemoryDocument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDocument")
			.field("title", &self.title)
			.field("nodes", &self.nodes.len())
			.finish()
	}
}
