//! Normalized descriptions of managed tags and attribute bags.
//!
//! Descriptors are rebuilt on every resolve and never mutated afterwards.
//! Sameness across resolves goes through [`TagIdentity`], never through the
//! descriptor values themselves.

use crate::attr::TagAttr;
use crate::field::{MetaField, Placement};
use crate::raw::LoadCallback;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identity of a tag across resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagIdentity {
	/// Declared identifier.
	Keyed(String),
	/// Digest of the tag's content plus its rank among identical tags.
	Structural {
		/// Hex digest of tag name, attributes and content.
		digest: String,
		/// Zero-based rank among tags of the field with the same digest.
		occurrence: usize,
	},
}

impl fmt::Display for TagIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Keyed(vmid) => write!(f, "#{}", vmid),
			Self::Structural { digest, occurrence } => write!(f, "@{}:{}", digest, occurrence),
		}
	}
}

/// A tag's field plus its identity. Reported to the `changed` hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey {
	/// Field the tag belongs to.
	pub field: MetaField,
	/// Identity within the field.
	pub identity: TagIdentity,
}

impl TagKey {
	/// Creates a key.
	pub fn new(field: MetaField, identity: TagIdentity) -> Self {
		Self { field, identity }
	}
}

impl fmt::Display for TagKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.field, self.identity)
	}
}

/// Inner content of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagContent {
	/// Text (`innerHTML` / `cssText`), HTML-escaped unless exempt.
	Text(String),
	/// Serialized JSON payload of a script. Never HTML-escaped.
	Json(String),
}

impl TagContent {
	/// The raw content.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Text(s) | Self::Json(s) => s,
		}
	}

	/// The content as the document holds it once parsed.
	///
	/// JSON is script-escaped (see [`escape_json_for_script`]); text is
	/// unchanged.
	pub fn dom_text(&self) -> Cow<'_, str> {
		match self {
			Self::Text(text) => Cow::Borrowed(text),
			Self::Json(json) => Cow::Owned(escape_json_for_script(json)),
		}
	}
}

/// Escapes serialized JSON for embedding in a `<script>` element.
///
/// `</` becomes `<\/`, which JSON and JavaScript read back as `</` while the
/// HTML parser no longer sees an end tag.
pub fn escape_json_for_script(json: &str) -> String {
	json.replace("</", "<\\/")
}

/// Attribute names of a tag's content in sanitizer exemptions.
pub const CONTENT_EXEMPTION: &str = "innerHTML";

/// Marker value of elements the client created.
pub const CLIENT_MARKER_VALUE: &str = "true";

/// Marker value of server-rendered render-once elements.
///
/// The client adopts these elements as render-once and never removes them,
/// whatever the first client-side resolve declares.
pub const ONCE_MARKER_VALUE: &str = "once";

/// One element the engine manages.
#[derive(Debug, Clone, PartialEq)]
pub struct TagDescriptor {
	/// Field the element belongs to.
	pub field: MetaField,
	/// Element name.
	pub tag_name: &'static str,
	/// Attributes in output order, without the engine's marker attribute.
	pub attributes: Vec<TagAttr>,
	/// Inner content.
	pub content: Option<TagContent>,
	/// Where the element lives.
	pub placement: Placement,
	/// Declared identifier.
	pub identifier: Option<String>,
	/// Identity across resolves.
	pub identity: TagIdentity,
	/// Never recreated or removed once present.
	pub render_once: bool,
	/// Attribute names emitted unescaped. [`CONTENT_EXEMPTION`] covers the content.
	pub sanitize_disabled: BTreeSet<String>,
	/// Invoked once the element loaded.
	pub callback: Option<LoadCallback>,
}

impl TagDescriptor {
	/// The tag's key.
	pub fn key(&self) -> TagKey {
		TagKey::new(self.field, self.identity.clone())
	}

	/// Returns the value of attribute `name`, `Some("")` when bare.
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|attr| attr.name == name)
			.map(TagAttr::dom_value)
	}

	/// Whether attribute `name` may be emitted unescaped.
	pub fn is_sanitize_disabled(&self, name: &str) -> bool {
		self.sanitize_disabled.contains(name)
	}

	/// Text that changes whenever the rendered element would change.
	pub fn fingerprint(&self) -> String {
		let mut out = String::from(self.tag_name);
		for attr in &self.attributes {
			out.push('\u{1f}');
			out.push_str(&attr.name);
			if let Some(value) = &attr.value {
				out.push('=');
				out.push_str(value);
			}
		}
		out.push('\u{1e}');
		if let Some(content) = &self.content {
			out.push_str(content.as_str());
		}
		out
	}
}

/// Hex SHA-256 over a tag name, its attributes and its content.
///
/// The engine's marker and identifier attributes must not be part of
/// `attributes`.
pub fn structural_digest(tag_name: &str, attributes: &[TagAttr], content: Option<&str>) -> String {
	let mut hasher = Sha256::new();
	hasher.update(tag_name.as_bytes());
	for attr in attributes {
		hasher.update([0u8]);
		hasher.update(attr.name.as_bytes());
		match &attr.value {
			Some(value) => {
				hasher.update([1u8]);
				hasher.update(value.as_bytes());
			}
			None => hasher.update([2u8]),
		}
	}
	hasher.update([3u8]);
	if let Some(content) = content {
		hasher.update(content.as_bytes());
	}
	let digest = format!("{:x}", hasher.finalize());
	digest[..16].to_string()
}

/// The resolved title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleInstruction {
	/// Final text after the template. Empty means no title is emitted.
	pub text: String,
	/// Whether the text must be escaped.
	pub escape: bool,
}

impl TitleInstruction {
	/// Whether there is nothing to emit.
	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}
}

/// The resolved attributes of `<html>`, `<head>` or `<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrsInstruction {
	/// Which bag this is.
	pub field: MetaField,
	/// Whether any component declared the bag.
	pub declared: bool,
	/// Rendered attributes in declaration order.
	pub attributes: Vec<TagAttr>,
	/// Whether the server-render marker belongs on this bag.
	pub ssr_marker: bool,
	/// Attribute names emitted unescaped.
	pub sanitize_disabled: BTreeSet<String>,
}

impl AttrsInstruction {
	/// The names this bag manages, sorted and comma-joined.
	pub fn managed_names(&self) -> String {
		let names: BTreeSet<&str> = self.attributes.iter().map(|a| a.name.as_str()).collect();
		names.into_iter().collect::<Vec<_>>().join(",")
	}

	/// Whether the bag has no attributes of its own.
	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty()
	}
}

/// The Tag Generator's output for one resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstructions {
	/// The title.
	pub title: TitleInstruction,
	/// `<html>` attributes.
	pub html_attrs: AttrsInstruction,
	/// `<head>` attributes.
	pub head_attrs: AttrsInstruction,
	/// `<body>` attributes.
	pub body_attrs: AttrsInstruction,
	tags: BTreeMap<MetaField, Vec<TagDescriptor>>,
}

impl RenderInstructions {
	pub(crate) fn new(
		title: TitleInstruction,
		[html_attrs, head_attrs, body_attrs]: [AttrsInstruction; 3],
		tags: BTreeMap<MetaField, Vec<TagDescriptor>>,
	) -> Self {
		Self {
			title,
			html_attrs,
			head_attrs,
			body_attrs,
			tags,
		}
	}

	/// The descriptors of an element field in emission order.
	pub fn tags(&self, field: MetaField) -> &[TagDescriptor] {
		self.tags.get(&field).map(Vec::as_slice).unwrap_or(&[])
	}

	/// The descriptors of an element field at `placement`.
	pub fn tags_at(
		&self,
		field: MetaField,
		placement: Placement,
	) -> impl Iterator<Item = &TagDescriptor> {
		self.tags(field)
			.iter()
			.filter(move |tag| tag.placement == placement)
	}

	/// Every descriptor, field by field.
	pub fn all_tags(&self) -> impl Iterator<Item = &TagDescriptor> {
		MetaField::ELEMENTS
			.into_iter()
			.flat_map(move |field| self.tags(field).iter())
	}

	/// The instruction of an attribute bag.
	pub fn attrs(&self, field: MetaField) -> Option<&AttrsInstruction> {
		match field {
			MetaField::HtmlAttrs => Some(&self.html_attrs),
			MetaField::HeadAttrs => Some(&self.head_attrs),
			MetaField::BodyAttrs => Some(&self.body_attrs),
			_ => None,
		}
	}
}
