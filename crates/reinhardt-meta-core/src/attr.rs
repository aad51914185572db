//! Attribute values and ordered attribute maps.

use indexmap::IndexMap;
use serde_json::Value;
use std::hash::{Hash, Hasher};

/// HTML attributes rendered as a bare name when truthy and omitted when falsy.
pub const BOOLEAN_ATTRIBUTES: &[&str] = &[
	"allowfullscreen",
	"amp",
	"async",
	"autofocus",
	"autoplay",
	"checked",
	"compact",
	"controls",
	"declare",
	"default",
	"defaultchecked",
	"defaultmuted",
	"defaultselected",
	"defer",
	"disabled",
	"enabled",
	"formnovalidate",
	"hidden",
	"indeterminate",
	"inert",
	"ismap",
	"itemscope",
	"loop",
	"multiple",
	"muted",
	"nohref",
	"noresize",
	"noshade",
	"novalidate",
	"nowrap",
	"open",
	"pauseonexit",
	"readonly",
	"required",
	"reversed",
	"scoped",
	"seamless",
	"selected",
	"sortable",
	"truespeed",
	"typemustmatch",
	"visible",
];

/// Returns true if `name` is a boolean HTML attribute.
pub fn is_boolean_attribute(name: &str) -> bool {
	BOOLEAN_ATTRIBUTES.contains(&name.to_ascii_lowercase().as_str())
}

/// A declared attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
	/// A plain string value.
	Text(String),
	/// Several tokens, joined with a space when rendered.
	List(Vec<String>),
	/// A boolean value.
	Flag(bool),
}

impl AttrValue {
	/// Reads a JSON value. `null` and objects carry no attribute value.
	pub fn from_json(value: &Value) -> Option<Self> {
		match value {
			Value::String(s) => Some(Self::Text(s.clone())),
			Value::Bool(b) => Some(Self::Flag(*b)),
			Value::Number(n) => Some(Self::Text(n.to_string())),
			Value::Array(items) => Some(Self::List(
				items
					.iter()
					.filter_map(|item| match item {
						Value::String(s) => Some(s.clone()),
						Value::Number(n) => Some(n.to_string()),
						Value::Bool(b) => Some(b.to_string()),
						_ => None,
					})
					.collect(),
			)),
			Value::Null | Value::Object(_) => None,
		}
	}

	/// Whether the value counts as set for a boolean attribute.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Text(s) => !s.is_empty(),
			Self::List(items) => !items.is_empty(),
			Self::Flag(b) => *b,
		}
	}

	/// The string form of the value.
	pub fn to_value_string(&self) -> String {
		match self {
			Self::Text(s) => s.clone(),
			Self::List(items) => items.join(" "),
			Self::Flag(b) => b.to_string(),
		}
	}

	/// Renders the value for attribute `name`.
	///
	/// Returns `None` when the attribute must be omitted, `Some(None)` for a
	/// bare boolean attribute and `Some(Some(value))` otherwise.
	pub fn render(&self, name: &str) -> Option<Option<String>> {
		if is_boolean_attribute(name) {
			return self.is_truthy().then_some(None);
		}
		Some(Some(self.to_value_string()))
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Flag(value)
	}
}

impl From<Vec<String>> for AttrValue {
	fn from(value: Vec<String>) -> Self {
		Self::List(value)
	}
}

impl From<Vec<&str>> for AttrValue {
	fn from(value: Vec<&str>) -> Self {
		Self::List(value.into_iter().map(str::to_string).collect())
	}
}

/// Attribute map preserving declaration order with unique keys.
///
/// Inserting an existing key replaces its value in place. Two maps are equal
/// only when they hold the same entries in the same order.
#[derive(Debug, Clone, Default)]
pub struct AttrMap {
	entries: IndexMap<String, AttrValue>,
}

impl AttrMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces `name`.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
		self.entries.insert(name.into(), value.into());
	}

	/// Builder form of [`AttrMap::insert`].
	pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.insert(name, value);
		self
	}

	/// Returns the value of `name`.
	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.entries.get(name)
	}

	/// Returns a mutable reference to the value of `name`.
	pub fn get_mut(&mut self, name: &str) -> Option<&mut AttrValue> {
		self.entries.get_mut(name)
	}

	/// Whether `name` is present.
	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Removes `name`, returning its value. Later entries keep their order.
	pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
		self.entries.shift_remove(name)
	}

	/// Shallow merge: every key of `other` overwrites the same key here.
	pub fn merge(&mut self, other: &AttrMap) {
		for (name, value) in &other.entries {
			self.entries.insert(name.clone(), value.clone());
		}
	}

	/// Iterates entries in declaration order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Attribute names in declaration order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the map is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Reads a JSON object, keeping key order. Values that are not
	/// attribute values are skipped.
	pub fn from_json(value: &Value) -> Option<Self> {
		let object = value.as_object()?;
		let mut map = Self::new();
		for (name, value) in object {
			if let Some(value) = AttrValue::from_json(value) {
				map.insert(name.clone(), value);
			}
		}
		Some(map)
	}
}

impl PartialEq for AttrMap {
	fn eq(&self, other: &Self) -> bool {
		self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
	}
}

impl Eq for AttrMap {}

impl Hash for AttrMap {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.entries.len().hash(state);
		for entry in &self.entries {
			entry.hash(state);
		}
	}
}

impl<K, V> FromIterator<(K, V)> for AttrMap
where
	K: Into<String>,
	V: Into<AttrValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut map = Self::new();
		for (name, value) in iter {
			map.insert(name, value);
		}
		map
	}
}

/// A rendered attribute: `value` is `None` for a bare boolean attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagAttr {
	/// Attribute name.
	pub name: String,
	/// Attribute value, unescaped.
	pub value: Option<String>,
}

impl TagAttr {
	/// Creates a valued attribute.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: Some(value.into()),
		}
	}

	/// Creates a bare attribute.
	pub fn bare(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: None,
		}
	}

	/// The value as the DOM stores it (bare attributes hold an empty string).
	pub fn dom_value(&self) -> &str {
		self.value.as_deref().unwrap_or("")
	}
}

/// Renders a declared map into attributes, dropping falsy boolean attributes.
pub fn render_attributes(map: &AttrMap) -> Vec<TagAttr> {
	map.iter()
		.filter_map(|(name, value)| {
			value.render(name).map(|value| TagAttr {
				name: name.to_string(),
				value,
			})
		})
		.collect()
}
