//! The DOM capabilities the reconciler relies on.
//!
//! Implemented by [`MemoryDocument`](crate::memory::MemoryDocument) and, in
//! the browser, by `WebDocument` (`web` feature).

use std::fmt;

/// Element that hosts managed tags or attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomTarget {
	/// `<html>`.
	Html,
	/// `<head>`.
	Head,
	/// `<body>`.
	Body,
}

impl DomTarget {
	/// Every target.
	pub const ALL: [DomTarget; 3] = [DomTarget::Html, DomTarget::Head, DomTarget::Body];

	/// The element name.
	pub fn tag_name(self) -> &'static str {
		match self {
			Self::Html => "html",
			Self::Head => "head",
			Self::Body => "body",
		}
	}
}

impl fmt::Display for DomTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag_name())
	}
}

/// Listener run once when an element fires its load event.
pub type LoadListener = Box<dyn FnOnce() + 'static>;

/// Minimal document interface.
///
/// Attribute values are plain strings: a bare boolean attribute is stored
/// with an empty value, the way browsers store it.
pub trait MetaDom {
	/// Handle to an element. Cloning a handle never clones the element.
	type Node: Clone + PartialEq + fmt::Debug;

	/// The `<html>`, `<head>` or `<body>` element.
	fn target(&self, target: DomTarget) -> Option<Self::Node>;

	/// The document title.
	fn title(&self) -> String;

	/// Replaces the document title.
	fn set_title(&mut self, title: &str);

	/// Creates a detached element. `None` when the host refuses the name.
	fn create_element(&mut self, tag_name: &str) -> Option<Self::Node>;

	/// Lowercase element name.
	fn tag_name(&self, node: &Self::Node) -> String;

	/// Attributes in document order.
	fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;

	/// Value of attribute `name`.
	fn get_attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

	/// Sets attribute `name`.
	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

	/// Removes attribute `name`.
	fn remove_attribute(&mut self, node: &Self::Node, name: &str);

	/// Text content.
	fn content(&self, node: &Self::Node) -> String;

	/// Replaces the content.
	fn set_content(&mut self, node: &Self::Node, content: &str);

	/// Element children in document order.
	fn children(&self, parent: &Self::Node) -> Vec<Self::Node>;

	/// Moves `child` to the end of `parent`.
	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

	/// Moves `child` to the start of `parent`.
	fn prepend_child(&mut self, parent: &Self::Node, child: &Self::Node);

	/// Detaches `node` from its parent.
	fn remove_node(&mut self, node: &Self::Node);

	/// Whether `node` is attached to the document.
	fn is_connected(&self, node: &Self::Node) -> bool;

	/// Whether `node` already fired its load event.
	fn is_loaded(&self, node: &Self::Node) -> bool;

	/// Runs `listener` once when `node` fires its load event.
	fn add_load_listener(&mut self, node: &Self::Node, listener: LoadListener);
}
