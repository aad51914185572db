//! Browser document backed by `web-sys`.

use crate::dom::{DomTarget, LoadListener, MetaDom};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::Closure;
use web_sys::{Document, Element};

/// Property server-rendered elements set from their `onload` attribute.
const LOADED_FLAG: &str = "__vm_l";

/// The live browser document.
#[derive(Debug, Clone)]
pub struct WebDocument {
	document: Document,
}

impl WebDocument {
	/// Wraps a document.
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	/// The current window's document.
	pub fn from_window() -> Option<Self> {
		web_sys::window()
			.and_then(|window| window.document())
			.map(Self::new)
	}

	/// The wrapped document.
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn report(operation: &'static str, result: Result<(), JsValue>) {
	if let Err(err) = result {
		tracing::warn!(operation, error = ?err, "DOM operation failed");
	}
}

fn uses_markup_content(node: &Element) -> bool {
	node.tag_name().eq_ignore_ascii_case("noscript")
}

impl MetaDom for WebDocument {
	type Node = Element;

	fn target(&self, target: DomTarget) -> Option<Element> {
		match target {
			DomTarget::Html => self.document.document_element(),
			DomTarget::Head => self.document.head().map(Element::from),
			DomTarget::Body => self.document.body().map(Element::from),
		}
	}

	fn title(&self) -> String {
		self.document.title()
	}

	fn set_title(&mut self, title: &str) {
		self.document.set_title(title);
	}

	fn create_element(&mut self, tag_name: &str) -> Option<Element> {
		match self.document.create_element(tag_name) {
			Ok(element) => Some(element),
			Err(err) => {
				tracing::warn!(tag_name, error = ?err, "createElement failed");
				None
			}
		}
	}

	fn tag_name(&self, node: &Element) -> String {
		node.tag_name().to_ascii_lowercase()
	}

	fn attributes(&self, node: &Element) -> Vec<(String, String)> {
		node.get_attribute_names()
			.iter()
			.filter_map(|name| name.as_string())
			.filter_map(|name| {
				let value = node.get_attribute(&name)?;
				Some((name, value))
			})
			.collect()
	}

	fn get_attribute(&self, node: &Element, name: &str) -> Option<String> {
		node.get_attribute(name)
	}

	fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
		report("setAttribute", node.set_attribute(name, value));
	}

	fn remove_attribute(&mut self, node: &Element, name: &str) {
		report("removeAttribute", node.remove_attribute(name));
	}

	fn content(&self, node: &Element) -> String {
		if uses_markup_content(node) {
			node.inner_html()
		} else {
			node.text_content().unwrap_or_default()
		}
	}

	fn set_content(&mut self, node: &Element, content: &str) {
		if uses_markup_content(node) {
			node.set_inner_html(content);
		} else {
			node.set_text_content(Some(content));
		}
	}

	fn children(&self, parent: &Element) -> Vec<Element> {
		let children = parent.children();
		(0..children.length())
			.filter_map(|index| children.item(index))
			.collect()
	}

	fn append_child(&mut self, parent: &Element, child: &Element) {
		report("appendChild", parent.append_child(child).map(|_| ()));
	}

	fn prepend_child(&mut self, parent: &Element, child: &Element) {
		let first = parent.first_child();
		report(
			"insertBefore",
			parent.insert_before(child, first.as_ref()).map(|_| ()),
		);
	}

	fn remove_node(&mut self, node: &Element) {
		node.remove();
	}

	fn is_connected(&self, node: &Element) -> bool {
		node.is_connected()
	}

	fn is_loaded(&self, node: &Element) -> bool {
		js_sys::Reflect::get(node.as_ref(), &JsValue::from_str(LOADED_FLAG))
			.map(|flag| flag.is_truthy())
			.unwrap_or(false)
	}

	fn add_load_listener(&mut self, node: &Element, listener: LoadListener) {
		let mut listener = Some(listener);
		let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
			if let Some(listener) = listener.take() {
				listener();
			}
		}) as Box<dyn FnMut(_)>);

		report(
			"addEventListener",
			node.add_event_listener_with_callback("load", closure.as_ref().unchecked_ref()),
		);
		// The element owns the listener from here on.
		closure.forget();
	}
}
