//! Raw per-component metadata declarations.
//!
//! A [`RawMetaInfo`] is the snapshot one component declares. The resolver
//! folds an ordered list of them into one [`MergedMetaInfo`].
//!
//! ```
//! use reinhardt_meta_core::{RawMetaInfo, RawTag};
//!
//! let info = RawMetaInfo::new()
//!     .title("Home")
//!     .title_template("%s | Example")
//!     .meta(RawTag::meta_name("description", "Landing page").vmid("description"))
//!     .script(RawTag::script_src("/app.js").body());
//!
//! assert_eq!(info.meta.len(), 1);
//! ```
//!
//! [`MergedMetaInfo`]: crate::resolve::MergedMetaInfo

use crate::attr::{AttrMap, AttrValue};
use crate::descriptor::TagKey;
use crate::error::{MetaError, MetaResult};
use crate::field::MetaField;
use crate::options::MetaOptions;
use crate::resolve::MergedMetaInfo;
use crate::template::Template;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Raw-object key disabling escaping for whole fields.
pub const DISABLE_SANITIZERS_KEY: &str = "__dangerouslyDisableSanitizers";

/// Raw-object key disabling escaping for attributes of identified entries.
pub const DISABLE_SANITIZERS_BY_TAG_ID_KEY: &str = "__dangerouslyDisableSanitizersByTagID";

/// Keys naming a tag's inner content in sanitizer exemptions.
pub const CONTENT_KEYS: [&str; 2] = ["innerHTML", "cssText"];

/// Attributes that identify what a `meta` entry describes.
pub const META_DISCRIMINANTS: [&str; 5] = ["name", "property", "http-equiv", "charset", "itemprop"];

/// Callback run once an element's load event fired.
#[derive(Clone)]
pub struct LoadCallback(Arc<dyn Fn() + Send + Sync>);

impl LoadCallback {
	/// Wraps a function.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn() + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	/// Invokes the callback.
	pub fn call(&self) {
		(self.0)()
	}
}

impl fmt::Debug for LoadCallback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("LoadCallback(..)")
	}
}

impl PartialEq for LoadCallback {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

/// Hook run after every completed client cycle with the added and removed tags.
#[derive(Clone)]
pub struct ChangedHook(Arc<dyn Fn(&MergedMetaInfo, &[TagKey], &[TagKey]) + Send + Sync>);

impl ChangedHook {
	/// Wraps a function.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&MergedMetaInfo, &[TagKey], &[TagKey]) + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	/// Invokes the hook.
	pub fn call(&self, info: &MergedMetaInfo, added: &[TagKey], removed: &[TagKey]) {
		(self.0)(info, added, removed)
	}
}

impl fmt::Debug for ChangedHook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("ChangedHook(..)")
	}
}

/// Hook run once the refresh following a navigation completed.
#[derive(Clone)]
pub struct AfterNavigationHook(Arc<dyn Fn(&MergedMetaInfo) + Send + Sync>);

impl AfterNavigationHook {
	/// Wraps a function.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&MergedMetaInfo) + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	/// Invokes the hook.
	pub fn call(&self, info: &MergedMetaInfo) {
		(self.0)(info)
	}
}

impl fmt::Debug for AfterNavigationHook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("AfterNavigationHook(..)")
	}
}

/// One entry of a list field (`meta`, `link`, `style`, `script`, `noscript`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTag {
	/// Identifier used to override the same logical tag across components.
	pub vmid: Option<String>,
	/// Element attributes in declaration order.
	pub attrs: AttrMap,
	/// Inner content (`innerHTML` / `cssText`).
	pub content: Option<String>,
	/// JSON payload rendered as the content of a script.
	pub json: Option<Value>,
	/// Template applied to the `content` attribute of a meta entry.
	pub template: Option<Template>,
	/// Render once and never recreate or remove afterwards.
	pub once: bool,
	/// Take part in the merge but never emit.
	pub skip: bool,
	/// Place at the end of the body.
	pub body: bool,
	/// Place at the start of the body.
	pub pbody: bool,
	/// Invoked once after the element loaded.
	pub callback: Option<LoadCallback>,
	/// Removes an earlier entry sharing the identifier instead of replacing it.
	pub removal: bool,
}

impl RawTag {
	/// Creates an empty entry.
	pub fn new() -> Self {
		Self::default()
	}

	/// `<meta name=".." content="..">`.
	pub fn meta_name(name: impl Into<String>, content: impl Into<String>) -> Self {
		Self::new()
			.attr("name", name.into())
			.attr("content", content.into())
	}

	/// `<meta property=".." content="..">`.
	pub fn meta_property(property: impl Into<String>, content: impl Into<String>) -> Self {
		Self::new()
			.attr("property", property.into())
			.attr("content", content.into())
	}

	/// `<meta charset="..">`.
	pub fn charset(charset: impl Into<String>) -> Self {
		Self::new().attr("charset", charset.into())
	}

	/// `<link rel=".." href="..">`.
	pub fn link(rel: impl Into<String>, href: impl Into<String>) -> Self {
		Self::new()
			.attr("rel", rel.into())
			.attr("href", href.into())
	}

	/// `<script src="..">`.
	pub fn script_src(src: impl Into<String>) -> Self {
		Self::new().attr("src", src.into())
	}

	/// An entry carrying only inner content (inline script, style, noscript).
	pub fn inline(content: impl Into<String>) -> Self {
		Self::new().content(content)
	}

	/// Removes the entry identified by `vmid` from the merged list.
	pub fn remove(vmid: impl Into<String>) -> Self {
		Self {
			vmid: Some(vmid.into()),
			removal: true,
			..Self::default()
		}
	}

	/// Sets the identifier.
	pub fn vmid(mut self, vmid: impl Into<String>) -> Self {
		self.vmid = Some(vmid.into());
		self
	}

	/// Sets an attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attrs.insert(name, value);
		self
	}

	/// Sets the inner content.
	pub fn content(mut self, content: impl Into<String>) -> Self {
		self.content = Some(content.into());
		self
	}

	/// Sets a JSON payload.
	pub fn json(mut self, json: Value) -> Self {
		self.json = Some(json);
		self
	}

	/// Sets the content template.
	pub fn template(mut self, template: impl Into<Template>) -> Self {
		self.template = Some(template.into());
		self
	}

	/// Marks the entry render-once.
	pub fn once(mut self) -> Self {
		self.once = true;
		self
	}

	/// Marks the entry skipped.
	pub fn skip(mut self) -> Self {
		self.skip = true;
		self
	}

	/// Places the entry at the end of the body.
	pub fn body(mut self) -> Self {
		self.body = true;
		self
	}

	/// Places the entry at the start of the body.
	pub fn pbody(mut self) -> Self {
		self.pbody = true;
		self
	}

	/// Sets the load callback.
	pub fn callback<F>(mut self, f: F) -> Self
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.callback = Some(LoadCallback::new(f));
		self
	}

	/// Whether the entry declares nothing at all.
	pub fn is_empty(&self) -> bool {
		self.vmid.is_none()
			&& self.attrs.is_empty()
			&& self.content.is_none()
			&& self.json.is_none()
			&& !self.removal
	}

	/// Whether the entry carries what its field requires to mean anything.
	pub fn is_well_formed(&self, field: MetaField) -> bool {
		if self.removal {
			return self.vmid.is_some();
		}
		let has_content = self.content.as_deref().is_some_and(|c| !c.is_empty());
		match field {
			MetaField::Meta => META_DISCRIMINANTS
				.iter()
				.any(|name| self.attrs.contains(name)),
			MetaField::Link => self.attrs.contains("rel") || self.attrs.contains("href"),
			MetaField::Style | MetaField::Noscript => has_content,
			MetaField::Script => has_content || self.json.is_some() || self.attrs.contains("src"),
			_ => false,
		}
	}

	/// Canonical text of everything the entry declares except its callback.
	///
	/// Two entries with equal keys render identically.
	pub fn canonical_key(&self) -> String {
		let attrs: Vec<Value> = self
			.attrs
			.iter()
			.map(|(name, value)| match value {
				AttrValue::Text(s) => json!([name, "t", s]),
				AttrValue::List(items) => json!([name, "l", items]),
				AttrValue::Flag(b) => json!([name, "f", b]),
			})
			.collect();
		let template = match &self.template {
			Some(Template::Pattern(pattern)) => Value::String(pattern.clone()),
			Some(Template::Func(_)) => Value::String("<fn>".to_string()),
			None => Value::Null,
		};
		json!([
			self.vmid,
			attrs,
			self.content,
			self.json,
			template,
			[self.once, self.skip, self.body, self.pbody],
		])
		.to_string()
	}

	/// Reads one list entry. Returns `None` when `value` is not an object.
	pub fn from_json(field: MetaField, value: &Value, options: &MetaOptions) -> Option<Self> {
		let object = value.as_object()?;
		let mut tag = Self::new();
		let mut content_nulled = false;

		for (key, value) in object {
			let key = key.as_str();
			if key == options.tag_id_key_name {
				tag.vmid = match value {
					Value::String(s) => Some(s.clone()),
					Value::Number(n) => Some(n.to_string()),
					_ => None,
				};
				continue;
			}
			match key {
				"once" => tag.once = is_truthy(value),
				"skip" => tag.skip = is_truthy(value),
				"body" => tag.body = is_truthy(value),
				"pbody" => tag.pbody = is_truthy(value),
				"innerHTML" | "cssText" => match value {
					Value::Null => content_nulled = true,
					Value::String(s) => tag.content = Some(s.clone()),
					_ => {}
				},
				"json" => {
					if !value.is_null() {
						tag.json = Some(value.clone());
					}
				}
				"template" if field == MetaField::Meta => {
					tag.template = Template::from_json(value);
				}
				"callback" => {}
				"content" if field == MetaField::Meta && value.is_null() => {
					content_nulled = true;
				}
				"httpEquiv" => {
					if let Some(value) = AttrValue::from_json(value) {
						tag.attrs.insert("http-equiv", value);
					}
				}
				_ => {
					if let Some(value) = AttrValue::from_json(value) {
						tag.attrs.insert(key, value);
					}
				}
			}
		}

		if content_nulled && tag.vmid.is_some() {
			tag.removal = true;
		}
		Some(tag)
	}
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Bool(b) => *b,
		Value::Null => false,
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

/// The metadata one component declares.
#[derive(Debug, Clone, Default)]
pub struct RawMetaInfo {
	/// Page title.
	pub title: Option<String>,
	/// Template applied to the winning title.
	pub title_template: Option<Template>,
	/// Attributes of `<html>`. `Some` with an empty map counts as declared.
	pub html_attrs: Option<AttrMap>,
	/// Attributes of `<head>`.
	pub head_attrs: Option<AttrMap>,
	/// Attributes of `<body>`.
	pub body_attrs: Option<AttrMap>,
	/// Attributes of the `<base>` element.
	pub base: Option<AttrMap>,
	/// `<meta>` entries.
	pub meta: Vec<RawTag>,
	/// `<link>` entries.
	pub link: Vec<RawTag>,
	/// `<style>` entries.
	pub style: Vec<RawTag>,
	/// `<script>` entries.
	pub script: Vec<RawTag>,
	/// `<noscript>` entries.
	pub noscript: Vec<RawTag>,
	/// Fields whose values are emitted without escaping.
	pub disable_sanitizers: BTreeSet<String>,
	/// Per identifier, attribute names emitted without escaping.
	pub disable_sanitizers_by_tag_id: BTreeMap<String, BTreeSet<String>>,
	/// Hook run after every client cycle.
	pub changed: Option<ChangedHook>,
	/// Hook run after the refresh following a navigation.
	pub after_navigation: Option<AfterNavigationHook>,
}

impl RawMetaInfo {
	/// Creates an empty declaration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the title.
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Sets the title template.
	pub fn title_template(mut self, template: impl Into<Template>) -> Self {
		self.title_template = Some(template.into());
		self
	}

	/// Sets the attributes of `<html>`.
	pub fn html_attrs(mut self, attrs: AttrMap) -> Self {
		self.html_attrs = Some(attrs);
		self
	}

	/// Sets the attributes of `<head>`.
	pub fn head_attrs(mut self, attrs: AttrMap) -> Self {
		self.head_attrs = Some(attrs);
		self
	}

	/// Sets the attributes of `<body>`.
	pub fn body_attrs(mut self, attrs: AttrMap) -> Self {
		self.body_attrs = Some(attrs);
		self
	}

	/// Sets the `<base>` attributes.
	pub fn base(mut self, attrs: AttrMap) -> Self {
		self.base = Some(attrs);
		self
	}

	/// Appends a `meta` entry.
	pub fn meta(mut self, tag: RawTag) -> Self {
		self.meta.push(tag);
		self
	}

	/// Appends a `link` entry.
	pub fn link(mut self, tag: RawTag) -> Self {
		self.link.push(tag);
		self
	}

	/// Appends a `style` entry.
	pub fn style(mut self, tag: RawTag) -> Self {
		self.style.push(tag);
		self
	}

	/// Appends a `script` entry.
	pub fn script(mut self, tag: RawTag) -> Self {
		self.script.push(tag);
		self
	}

	/// Appends a `noscript` entry.
	pub fn noscript(mut self, tag: RawTag) -> Self {
		self.noscript.push(tag);
		self
	}

	/// Emits every value of `field` unescaped.
	pub fn disable_sanitizer(mut self, field: impl Into<String>) -> Self {
		self.disable_sanitizers.insert(field.into());
		self
	}

	/// Emits attribute `name` of the entry identified by `vmid` unescaped.
	pub fn disable_sanitizer_for(mut self, vmid: impl Into<String>, name: impl Into<String>) -> Self {
		self.disable_sanitizers_by_tag_id
			.entry(vmid.into())
			.or_default()
			.insert(name.into());
		self
	}

	/// Sets the `changed` hook.
	pub fn on_changed<F>(mut self, f: F) -> Self
	where
		F: Fn(&MergedMetaInfo, &[TagKey], &[TagKey]) + Send + Sync + 'static,
	{
		self.changed = Some(ChangedHook::new(f));
		self
	}

	/// Sets the `afterNavigation` hook.
	pub fn on_after_navigation<F>(mut self, f: F) -> Self
	where
		F: Fn(&MergedMetaInfo) + Send + Sync + 'static,
	{
		self.after_navigation = Some(AfterNavigationHook::new(f));
		self
	}

	/// The entries of a list field. Other fields have none.
	pub fn list(&self, field: MetaField) -> &[RawTag] {
		match field {
			MetaField::Meta => &self.meta,
			MetaField::Link => &self.link,
			MetaField::Style => &self.style,
			MetaField::Script => &self.script,
			MetaField::Noscript => &self.noscript,
			_ => &[],
		}
	}

	/// The attribute map of an attribute bag or of `base`.
	pub fn attrs(&self, field: MetaField) -> Option<&AttrMap> {
		match field {
			MetaField::HtmlAttrs => self.html_attrs.as_ref(),
			MetaField::HeadAttrs => self.head_attrs.as_ref(),
			MetaField::BodyAttrs => self.body_attrs.as_ref(),
			MetaField::Base => self.base.as_ref(),
			_ => None,
		}
	}

	/// Whether nothing is declared.
	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.title_template.is_none()
			&& MetaField::ATTRIBUTE_BAGS
				.into_iter()
				.chain([MetaField::Base])
				.all(|field| self.attrs(field).is_none())
			&& MetaField::LISTS
				.into_iter()
				.all(|field| self.list(field).is_empty())
	}

	/// Reads a raw metadata object.
	///
	/// Unusable values are ignored: a non-string title, a template that is
	/// not a string, list items that are not objects. Only a top level that
	/// is not an object is an error.
	pub fn from_json(value: &Value, options: &MetaOptions) -> MetaResult<Self> {
		let object = value.as_object().ok_or_else(|| {
			MetaError::InvalidInput(format!("expected an object, found {}", kind_of(value)))
		})?;
		Ok(Self::from_json_object(object, options))
	}

	/// Reads a raw metadata object from JSON text.
	pub fn from_json_str(text: &str, options: &MetaOptions) -> MetaResult<Self> {
		let value: Value =
			serde_json::from_str(text).map_err(|e| MetaError::InvalidInput(e.to_string()))?;
		Self::from_json(&value, options)
	}

	fn from_json_object(object: &Map<String, Value>, options: &MetaOptions) -> Self {
		let mut info = Self::new();

		if let Some(Value::String(title)) = object.get("title") {
			info.title = Some(title.clone());
		}
		if let Some(template) = object.get("titleTemplate") {
			info.title_template = Template::from_json(template);
			if info.title_template.is_none() && !template.is_null() {
				tracing::debug!("ignoring titleTemplate that is not a string");
			}
		}

		info.html_attrs = object.get("htmlAttrs").and_then(AttrMap::from_json);
		info.head_attrs = object.get("headAttrs").and_then(AttrMap::from_json);
		info.body_attrs = object.get("bodyAttrs").and_then(AttrMap::from_json);
		info.base = object.get("base").and_then(AttrMap::from_json);

		for field in MetaField::LISTS {
			let Some(Value::Array(items)) = object.get(field.name()) else {
				continue;
			};
			let tags = items
				.iter()
				.filter_map(|item| RawTag::from_json(field, item, options))
				.collect();
			match field {
				MetaField::Meta => info.meta = tags,
				MetaField::Link => info.link = tags,
				MetaField::Style => info.style = tags,
				MetaField::Script => info.script = tags,
				MetaField::Noscript => info.noscript = tags,
				_ => {}
			}
		}

		if let Some(Value::Array(fields)) = object.get(DISABLE_SANITIZERS_KEY) {
			info.disable_sanitizers = fields
				.iter()
				.filter_map(|v| v.as_str().map(str::to_string))
				.collect();
		}
		if let Some(Value::Object(by_id)) = object.get(DISABLE_SANITIZERS_BY_TAG_ID_KEY) {
			for (vmid, names) in by_id {
				let Value::Array(names) = names else {
					continue;
				};
				info.disable_sanitizers_by_tag_id.insert(
					vmid.clone(),
					names
						.iter()
						.filter_map(|v| v.as_str().map(str::to_string))
						.collect(),
				);
			}
		}

		info
	}
}

fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
