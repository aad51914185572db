//! Collecting declarations from a component tree.
//!
//! The resolver wants a flat, root-first list. Hosts produce it from their
//! own hierarchy through [`MetaNode`], or hand over a JSON tree.

use crate::error::{MetaError, MetaResult};
use crate::options::MetaOptions;
use crate::raw::RawMetaInfo;
use serde_json::Value;

/// Key under which a JSON tree node lists its children.
pub const CHILDREN_KEY: &str = "children";

/// A node of the host's component tree.
pub trait MetaNode {
	/// Metadata declared by this node.
	fn meta_info(&self) -> Option<&RawMetaInfo>;

	/// Child nodes in render order.
	fn children(&self) -> Vec<&Self>;
}

/// Returns true if `node` or any descendant declares metadata.
pub fn has_meta_info<N: MetaNode>(node: &N) -> bool {
	node.meta_info().is_some() || node.children().into_iter().any(has_meta_info)
}

/// Pre-order walk of the tree, ancestors before descendants.
pub fn collect_meta_info<N: MetaNode>(root: &N) -> Vec<RawMetaInfo> {
	let mut out = Vec::new();
	let mut stack = vec![root];
	while let Some(node) = stack.pop() {
		if let Some(info) = node.meta_info() {
			out.push(info.clone());
		}
		stack.extend(node.children().into_iter().rev());
	}
	out
}

/// A plain owned component tree.
#[derive(Debug, Clone, Default)]
pub struct MetaTree {
	/// Metadata of this node.
	pub meta: Option<RawMetaInfo>,
	/// Child nodes.
	pub children: Vec<MetaTree>,
}

impl MetaTree {
	/// A node without metadata.
	pub fn new() -> Self {
		Self::default()
	}

	/// A node declaring `meta`.
	pub fn with_meta(meta: RawMetaInfo) -> Self {
		Self {
			meta: Some(meta),
			children: Vec::new(),
		}
	}

	/// Appends a child.
	pub fn child(mut self, child: MetaTree) -> Self {
		self.children.push(child);
		self
	}
}

impl MetaNode for MetaTree {
	fn meta_info(&self) -> Option<&RawMetaInfo> {
		self.meta.as_ref()
	}

	fn children(&self) -> Vec<&Self> {
		self.children.iter().collect()
	}
}

/// Walks a JSON component tree.
///
/// Each node is an object holding its metadata under `options.key_name` and
/// its children under `"children"`. Children that are not objects are skipped.
pub fn collect_json_tree(root: &Value, options: &MetaOptions) -> MetaResult<Vec<RawMetaInfo>> {
	if !root.is_object() {
		return Err(MetaError::InvalidInput(
			"component tree root must be an object".to_string(),
		));
	}

	let mut out = Vec::new();
	let mut stack = vec![root];
	while let Some(node) = stack.pop() {
		let Some(object) = node.as_object() else {
			tracing::debug!("skipping component tree node that is not an object");
			continue;
		};
		if let Some(meta) = object.get(&options.key_name) {
			match RawMetaInfo::from_json(meta, options) {
				Ok(info) => out.push(info),
				Err(err) => tracing::debug!(error = %err, "ignoring unusable node metadata"),
			}
		}
		if let Some(Value::Array(children)) = object.get(CHILDREN_KEY) {
			stack.extend(children.iter().rev());
		}
	}
	Ok(out)
}
