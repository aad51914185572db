//! Metadata fields and tag placement.

use std::fmt;

/// One document-metadata field.
///
/// The declaration order is the order fields are emitted in when a whole
/// head is rendered at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaField {
	/// `<title>`.
	Title,
	/// Attributes of the `<html>` element.
	HtmlAttrs,
	/// Attributes of the `<head>` element.
	HeadAttrs,
	/// Attributes of the `<body>` element.
	BodyAttrs,
	/// The single `<base>` element.
	Base,
	/// `<meta>` elements.
	Meta,
	/// `<link>` elements.
	Link,
	/// `<style>` elements.
	Style,
	/// `<script>` elements.
	Script,
	/// `<noscript>` elements.
	Noscript,
}

impl MetaField {
	/// All fields in emission order.
	pub const ALL: [MetaField; 10] = [
		MetaField::Title,
		MetaField::HtmlAttrs,
		MetaField::HeadAttrs,
		MetaField::BodyAttrs,
		MetaField::Base,
		MetaField::Meta,
		MetaField::Link,
		MetaField::Style,
		MetaField::Script,
		MetaField::Noscript,
	];

	/// Fields holding a list of element entries.
	pub const LISTS: [MetaField; 5] = [
		MetaField::Meta,
		MetaField::Link,
		MetaField::Style,
		MetaField::Script,
		MetaField::Noscript,
	];

	/// Fields rendered as elements (the base element plus every list field).
	pub const ELEMENTS: [MetaField; 6] = [
		MetaField::Base,
		MetaField::Meta,
		MetaField::Link,
		MetaField::Style,
		MetaField::Script,
		MetaField::Noscript,
	];

	/// Attribute bag fields.
	pub const ATTRIBUTE_BAGS: [MetaField; 3] = [
		MetaField::HtmlAttrs,
		MetaField::HeadAttrs,
		MetaField::BodyAttrs,
	];

	/// The camelCase name used in raw metadata objects.
	pub fn name(self) -> &'static str {
		match self {
			Self::Title => "title",
			Self::HtmlAttrs => "htmlAttrs",
			Self::HeadAttrs => "headAttrs",
			Self::BodyAttrs => "bodyAttrs",
			Self::Base => "base",
			Self::Meta => "meta",
			Self::Link => "link",
			Self::Style => "style",
			Self::Script => "script",
			Self::Noscript => "noscript",
		}
	}

	/// Looks a field up by its camelCase name.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|field| field.name() == name)
	}

	/// The element name this field renders to, or the element an attribute
	/// bag is applied to.
	pub fn tag_name(self) -> &'static str {
		match self {
			Self::Title => "title",
			Self::HtmlAttrs => "html",
			Self::HeadAttrs => "head",
			Self::BodyAttrs => "body",
			Self::Base => "base",
			Self::Meta => "meta",
			Self::Link => "link",
			Self::Style => "style",
			Self::Script => "script",
			Self::Noscript => "noscript",
		}
	}

	/// Maps an element name back to the element field that produces it.
	pub fn from_tag_name(tag_name: &str) -> Option<Self> {
		Self::ELEMENTS
			.into_iter()
			.find(|field| field.tag_name().eq_ignore_ascii_case(tag_name))
	}

	/// Whether this field holds a list of element entries.
	pub fn is_list(self) -> bool {
		Self::LISTS.contains(&self)
	}

	/// Whether this field is one of the attribute bags.
	pub fn is_attribute_bag(self) -> bool {
		Self::ATTRIBUTE_BAGS.contains(&self)
	}

	/// Whether elements of this field have no end tag.
	pub fn is_void(self) -> bool {
		matches!(self, Self::Base | Self::Meta | Self::Link)
	}

	/// Whether entries of this field may be placed in the body.
	pub fn supports_body_placement(self) -> bool {
		matches!(self, Self::Style | Self::Script | Self::Noscript)
	}
}

impl fmt::Display for MetaField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Where in the document an element is inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Placement {
	/// Inside `<head>`.
	#[default]
	Head,
	/// At the start of `<body>`.
	BodyPrepend,
	/// At the end of `<body>`.
	BodyAppend,
}

impl Placement {
	/// The data attribute that records a body placement on the element.
	pub fn data_attribute(self) -> Option<&'static str> {
		match self {
			Self::Head => None,
			Self::BodyPrepend => Some("data-pbody"),
			Self::BodyAppend => Some("data-body"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("htmlAttrs", MetaField::HtmlAttrs)]
	#[case("meta", MetaField::Meta)]
	#[case("noscript", MetaField::Noscript)]
	fn test_from_name(#[case] name: &str, #[case] expected: MetaField) {
		assert_eq!(MetaField::from_name(name), Some(expected));
		assert_eq!(expected.name(), name);
	}

	#[rstest]
	fn test_from_name_unknown() {
		assert_eq!(MetaField::from_name("titleTemplate"), None);
	}

	#[rstest]
	#[case("SCRIPT", Some(MetaField::Script))]
	#[case("base", Some(MetaField::Base))]
	#[case("title", None)]
	#[case("html", None)]
	fn test_from_tag_name(#[case] tag: &str, #[case] expected: Option<MetaField>) {
		assert_eq!(MetaField::from_tag_name(tag), expected);
	}

	#[rstest]
	fn test_field_kinds() {
		assert!(MetaField::Meta.is_void());
		assert!(!MetaField::Script.is_void());
		assert!(MetaField::BodyAttrs.is_attribute_bag());
		assert!(MetaField::Noscript.is_list());
		assert!(!MetaField::Base.is_list());
		assert!(MetaField::Style.supports_body_placement());
		assert!(!MetaField::Link.supports_body_placement());
	}

	#[rstest]
	fn test_placement_data_attribute() {
		assert_eq!(Placement::Head.data_attribute(), None);
		assert_eq!(Placement::BodyAppend.data_attribute(), Some("data-body"));
		assert_eq!(Placement::BodyPrepend.data_attribute(), Some("data-pbody"));
	}
}
