//! Title and content templates.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Substitution point in a string template.
pub const TEMPLATE_PLACEHOLDER: &str = "%s";

/// A template applied to a raw chunk (a title or a meta `content`).
#[derive(Clone)]
pub enum Template {
	/// A string in which every `%s` is replaced by the chunk.
	Pattern(String),
	/// A function computing the final text from the chunk.
	Func(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl Template {
	/// Creates a string template.
	pub fn pattern(pattern: impl Into<String>) -> Self {
		Self::Pattern(pattern.into())
	}

	/// Creates a function template.
	pub fn func<F>(f: F) -> Self
	where
		F: Fn(&str) -> String + Send + Sync + 'static,
	{
		Self::Func(Arc::new(f))
	}

	/// Reads a template from JSON. Anything but a string is no template.
	pub fn from_json(value: &Value) -> Option<Self> {
		value.as_str().map(Self::pattern)
	}

	/// Applies the template to `chunk`.
	///
	/// Empty chunks are returned as-is: templates never run on empty input.
	pub fn apply(&self, chunk: &str) -> String {
		if chunk.is_empty() {
			return String::new();
		}
		match self {
			Self::Pattern(pattern) => pattern.replace(TEMPLATE_PLACEHOLDER, chunk),
			Self::Func(f) => f(chunk),
		}
	}
}

/// Applies an optional template, treating a missing one as identity.
pub fn apply_template(template: Option<&Template>, chunk: &str) -> String {
	match template {
		Some(template) => template.apply(chunk),
		None => chunk.to_string(),
	}
}

impl fmt::Debug for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
			Self::Func(_) => f.write_str("Func(..)"),
		}
	}
}

impl PartialEq for Template {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Pattern(a), Self::Pattern(b)) => a == b,
			(Self::Func(a), Self::Func(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl From<&str> for Template {
	fn from(pattern: &str) -> Self {
		Self::pattern(pattern)
	}
}

impl From<String> for Template {
	fn from(pattern: String) -> Self {
		Self::Pattern(pattern)
	}
}
