//! Engine configuration.
//!
//! [`MetaOptions`] is the fixed option set shared by the server and client
//! sides. Unknown keys are rejected when loading from TOML or JSON.
//!
//! ```
//! use reinhardt_meta_core::MetaOptions;
//!
//! let options = MetaOptions::from_toml_str(r#"
//! attribute = "data-head"
//! ssrAppId = "app"
//! "#).unwrap();
//!
//! assert_eq!(options.attribute, "data-head");
//! assert_eq!(options.tag_id_key_name, "vmid");
//! ```

use crate::descriptor::{CLIENT_MARKER_VALUE, ONCE_MARKER_VALUE};
use crate::error::{MetaError, MetaResult};
use crate::field::MetaField;
use serde::{Deserialize, Serialize};

/// Default property name hosts look up component metadata under.
pub const DEFAULT_KEY_NAME: &str = "metaInfo";

/// Default marker attribute added to every managed element.
pub const DEFAULT_ATTRIBUTE: &str = "data-rh-meta";

/// Default marker recognising a server-rendered document.
pub const DEFAULT_SSR_ATTRIBUTE: &str = "data-rh-meta-ssr";

/// Default marker value for server-rendered elements.
pub const DEFAULT_SSR_APP_ID: &str = "ssr";

/// Default identifier key of list entries.
pub const DEFAULT_TAG_ID_KEY_NAME: &str = "vmid";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MetaOptions {
	/// Property name the host looks for metadata on.
	pub key_name: String,
	/// Marker attribute added to every tag and attribute bag the engine manages.
	pub attribute: String,
	/// Marker placed on `<html>` by the server so the client adopts existing tags.
	pub ssr_attribute: String,
	/// Marker value carried by server-rendered elements.
	pub ssr_app_id: String,
	/// Key holding the identifier of a list entry.
	#[serde(rename = "tagIDKeyName", alias = "tagIdKeyName")]
	pub tag_id_key_name: String,
	/// Pause updates while a navigation is in flight and refresh once after it.
	pub refresh_once_on_navigation: bool,
}

impl Default for MetaOptions {
	fn default() -> Self {
		Self {
			key_name: DEFAULT_KEY_NAME.to_string(),
			attribute: DEFAULT_ATTRIBUTE.to_string(),
			ssr_attribute: DEFAULT_SSR_ATTRIBUTE.to_string(),
			ssr_app_id: DEFAULT_SSR_APP_ID.to_string(),
			tag_id_key_name: DEFAULT_TAG_ID_KEY_NAME.to_string(),
			refresh_once_on_navigation: false,
		}
	}
}

impl MetaOptions {
	/// Creates the default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the metadata property name.
	pub fn key_name(mut self, key_name: impl Into<String>) -> Self {
		self.key_name = key_name.into();
		self
	}

	/// Sets the marker attribute.
	pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
		self.attribute = attribute.into();
		self
	}

	/// Sets the server-render marker attribute.
	pub fn ssr_attribute(mut self, ssr_attribute: impl Into<String>) -> Self {
		self.ssr_attribute = ssr_attribute.into();
		self
	}

	/// Sets the server-rendered marker value.
	pub fn ssr_app_id(mut self, ssr_app_id: impl Into<String>) -> Self {
		self.ssr_app_id = ssr_app_id.into();
		self
	}

	/// Sets the identifier key.
	pub fn tag_id_key_name(mut self, tag_id_key_name: impl Into<String>) -> Self {
		self.tag_id_key_name = tag_id_key_name.into();
		self
	}

	/// Enables or disables the single refresh after navigation.
	pub fn refresh_once_on_navigation(mut self, enabled: bool) -> Self {
		self.refresh_once_on_navigation = enabled;
		self
	}

	/// Loads and validates options from TOML text.
	pub fn from_toml_str(text: &str) -> MetaResult<Self> {
		let options: Self = toml::from_str(text)?;
		options.validate()?;
		Ok(options)
	}

	/// Loads and validates options from JSON text.
	pub fn from_json_str(text: &str) -> MetaResult<Self> {
		let options: Self = serde_json::from_str(text)?;
		options.validate()?;
		Ok(options)
	}

	/// The data attribute an entry identifier is serialized under.
	pub fn identifier_attribute(&self) -> String {
		format!("data-{}", self.tag_id_key_name)
	}

	/// Checks that the options can produce well-formed markup.
	pub fn validate(&self) -> MetaResult<()> {
		for (name, value) in [
			("keyName", &self.key_name),
			("attribute", &self.attribute),
			("ssrAttribute", &self.ssr_attribute),
			("ssrAppId", &self.ssr_app_id),
			("tagIDKeyName", &self.tag_id_key_name),
		] {
			if value.is_empty() {
				return Err(MetaError::InvalidOptions(format!(
					"{} must not be empty",
					name
				)));
			}
		}

		for (name, value) in [
			("attribute", &self.attribute),
			("ssrAttribute", &self.ssr_attribute),
			("tagIDKeyName", &self.tag_id_key_name),
		] {
			if !is_valid_attribute_name(value) {
				return Err(MetaError::InvalidOptions(format!(
					"{} '{}' is not a valid attribute name",
					name, value
				)));
			}
		}

		if self.ssr_app_id == ONCE_MARKER_VALUE || self.ssr_app_id == CLIENT_MARKER_VALUE {
			return Err(MetaError::InvalidOptions(format!(
				"ssrAppId '{}' is reserved",
				self.ssr_app_id
			)));
		}

		if self.attribute == self.ssr_attribute {
			return Err(MetaError::InvalidOptions(
				"attribute and ssrAttribute must differ".to_string(),
			));
		}

		Ok(())
	}
}

fn is_valid_attribute_name(name: &str) -> bool {
	!name.is_empty()
		&& !name
			.chars()
			.any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '/'))
}

/// What happens to an unkeyed list entry identical to one already merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
	/// Append every occurrence.
	Keep,
	/// Drop occurrences identical to an earlier unkeyed entry.
	Collapse,
}

/// Per-field handling of unkeyed duplicates during a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergePolicy {
	/// Policy for `meta` entries.
	pub meta: DuplicatePolicy,
	/// Policy for `link` entries.
	pub link: DuplicatePolicy,
	/// Policy for `style` entries.
	pub style: DuplicatePolicy,
	/// Policy for `script` entries.
	pub script: DuplicatePolicy,
	/// Policy for `noscript` entries.
	pub noscript: DuplicatePolicy,
}

impl Default for MergePolicy {
	fn default() -> Self {
		Self {
			meta: DuplicatePolicy::Keep,
			link: DuplicatePolicy::Keep,
			style: DuplicatePolicy::Collapse,
			script: DuplicatePolicy::Collapse,
			noscript: DuplicatePolicy::Collapse,
		}
	}
}

impl MergePolicy {
	/// Uses the same policy for every list field.
	pub fn uniform(policy: DuplicatePolicy) -> Self {
		Self {
			meta: policy,
			link: policy,
			style: policy,
			script: policy,
			noscript: policy,
		}
	}

	/// Overrides the policy of one list field.
	pub fn with(mut self, field: MetaField, policy: DuplicatePolicy) -> Self {
		match field {
			MetaField::Meta => self.meta = policy,
			MetaField::Link => self.link = policy,
			MetaField::Style => self.style = policy,
			MetaField::Script => self.script = policy,
			MetaField::Noscript => self.noscript = policy,
			_ => {}
		}
		self
	}

	/// The policy for `field`. Non-list fields always keep.
	pub fn for_field(&self, field: MetaField) -> DuplicatePolicy {
		match field {
			MetaField::Meta => self.meta,
			MetaField::Link => self.link,
			MetaField::Style => self.style,
			MetaField::Script => self.script,
			MetaField::Noscript => self.noscript,
			_ => DuplicatePolicy::Keep,
		}
	}
}
