//! Per-request server output.
//!
//! A [`ServerInjector`] resolves a component tree's declarations once and
//! exposes one view per field. Every view renders through `text(..)`, so a
//! host template can query the same result several times, once per
//! placement.
//!
//! ```
//! use reinhardt_meta_core::{MetaOptions, RawMetaInfo, RawTag};
//! use reinhardt_meta_ssr::{ServerInjector, TextOptions};
//!
//! let raw = RawMetaInfo::new()
//!     .meta(RawTag::charset("utf-8"))
//!     .script(RawTag::script_src("/app.js").body());
//! let injector = ServerInjector::generate(&raw, &MetaOptions::default()).unwrap();
//!
//! assert_eq!(injector.meta().text(TextOptions::new()), r#"<meta data-rh-meta="ssr" charset="utf-8">"#);
//! assert_eq!(injector.script().text(TextOptions::new()), "");
//! assert!(injector.script().text(TextOptions::body()).contains("/app.js"));
//! ```

use crate::serialize::{TextOptions, attrs_text, tags_text, title_text};
use reinhardt_meta_core::{
	AttrsInstruction, MergedMetaInfo, MetaField, MetaOptions, MetaResult, Placement, RawMetaInfo,
	RenderInstructions, Resolver, TagDescriptor, TitleInstruction, generate,
};

/// Fields emitted into `<head>`, in order.
const HEAD_FIELDS: [MetaField; 6] = [
	MetaField::Base,
	MetaField::Meta,
	MetaField::Link,
	MetaField::Style,
	MetaField::Script,
	MetaField::Noscript,
];

/// Fields that may be placed in the body, in order.
const BODY_FIELDS: [MetaField; 3] = [MetaField::Style, MetaField::Script, MetaField::Noscript];

/// Resolved metadata of one server render.
#[derive(Debug, Clone)]
pub struct ServerInjector {
	options: MetaOptions,
	merged: MergedMetaInfo,
	instructions: RenderInstructions,
}

impl ServerInjector {
	/// Resolves `infos` (root first) with the default merge policy.
	pub fn new(infos: &[RawMetaInfo], options: &MetaOptions) -> MetaResult<Self> {
		Self::with_resolver(&Resolver::new(), infos, options)
	}

	/// Resolves `infos` with an explicit resolver.
	pub fn with_resolver(
		resolver: &Resolver,
		infos: &[RawMetaInfo],
		options: &MetaOptions,
	) -> MetaResult<Self> {
		options.validate()?;
		let merged = resolver.resolve(infos);
		let instructions = generate(&merged, options);
		tracing::debug!(
			components = infos.len(),
			tags = instructions.all_tags().count(),
			"resolved server metadata"
		);
		Ok(Self {
			options: options.clone(),
			merged,
			instructions,
		})
	}

	/// Builds the output of a single raw declaration.
	pub fn generate(raw: &RawMetaInfo, options: &MetaOptions) -> MetaResult<Self> {
		Self::new(std::slice::from_ref(raw), options)
	}

	/// The active options.
	pub fn options(&self) -> &MetaOptions {
		&self.options
	}

	/// The merged declarations.
	pub fn merged(&self) -> &MergedMetaInfo {
		&self.merged
	}

	/// The generated instructions.
	pub fn instructions(&self) -> &RenderInstructions {
		&self.instructions
	}

	/// The title view.
	pub fn title(&self) -> TitleText<'_> {
		TitleText {
			title: &self.instructions.title,
		}
	}

	/// The `<html>` attribute view.
	pub fn html_attrs(&self) -> AttrsText<'_> {
		self.attrs_view(&self.instructions.html_attrs)
	}

	/// The `<head>` attribute view.
	pub fn head_attrs(&self) -> AttrsText<'_> {
		self.attrs_view(&self.instructions.head_attrs)
	}

	/// The `<body>` attribute view.
	pub fn body_attrs(&self) -> AttrsText<'_> {
		self.attrs_view(&self.instructions.body_attrs)
	}

	/// The `<base>` view.
	pub fn base(&self) -> TagsText<'_> {
		self.tags_view(MetaField::Base)
	}

	/// The `<meta>` view.
	pub fn meta(&self) -> TagsText<'_> {
		self.tags_view(MetaField::Meta)
	}

	/// The `<link>` view.
	pub fn link(&self) -> TagsText<'_> {
		self.tags_view(MetaField::Link)
	}

	/// The `<style>` view.
	pub fn style(&self) -> TagsText<'_> {
		self.tags_view(MetaField::Style)
	}

	/// The `<script>` view.
	pub fn script(&self) -> TagsText<'_> {
		self.tags_view(MetaField::Script)
	}

	/// The `<noscript>` view.
	pub fn noscript(&self) -> TagsText<'_> {
		self.tags_view(MetaField::Noscript)
	}

	/// Looks a view up by its camelCase field name.
	pub fn field(&self, name: &str) -> Option<FieldText<'_>> {
		let field = MetaField::from_name(name)?;
		Some(match field {
			MetaField::Title => FieldText::Title(self.title()),
			MetaField::HtmlAttrs => FieldText::Attrs(self.html_attrs()),
			MetaField::HeadAttrs => FieldText::Attrs(self.head_attrs()),
			MetaField::BodyAttrs => FieldText::Attrs(self.body_attrs()),
			_ => FieldText::Tags(self.tags_view(field)),
		})
	}

	/// Everything that belongs inside `<head>`.
	pub fn head(&self, ln: bool) -> String {
		let mut out = self.title().text();
		if ln && !out.is_empty() {
			out.push('\n');
		}
		let options = TextOptions::new().with_ln(ln);
		for field in HEAD_FIELDS {
			out.push_str(&self.tags_view(field).text(options));
		}
		out
	}

	/// Tags placed at the start of `<body>`.
	pub fn body_prepend(&self, ln: bool) -> String {
		self.body_tags(Placement::BodyPrepend, ln)
	}

	/// Tags placed at the end of `<body>`.
	pub fn body_append(&self, ln: bool) -> String {
		self.body_tags(Placement::BodyAppend, ln)
	}

	fn body_tags(&self, placement: Placement, ln: bool) -> String {
		let options = TextOptions::from(placement).with_ln(ln);
		BODY_FIELDS
			.into_iter()
			.map(|field| self.tags_view(field).text(options))
			.collect()
	}

	fn attrs_view<'a>(&'a self, bag: &'a AttrsInstruction) -> AttrsText<'a> {
		AttrsText {
			bag,
			options: &self.options,
		}
	}

	fn tags_view(&self, field: MetaField) -> TagsText<'_> {
		TagsText {
			tags: self.instructions.tags(field),
			options: &self.options,
		}
	}
}

/// Server view of the title.
#[derive(Debug, Clone, Copy)]
pub struct TitleText<'a> {
	title: &'a TitleInstruction,
}

impl TitleText<'_> {
	/// `<title>..</title>`, or nothing for an empty title.
	pub fn text(&self) -> String {
		title_text(self.title)
	}
}

/// Server view of an attribute bag.
#[derive(Debug, Clone, Copy)]
pub struct AttrsText<'a> {
	bag: &'a AttrsInstruction,
	options: &'a MetaOptions,
}

impl AttrsText<'_> {
	/// The inside of the start tag. `add_ssr_attribute` adds the
	/// server-render marker where it applies (`<html>` only).
	pub fn text(&self, add_ssr_attribute: bool) -> String {
		attrs_text(self.bag, self.options, add_ssr_attribute)
	}
}

/// Server view of an element field.
#[derive(Debug, Clone, Copy)]
pub struct TagsText<'a> {
	tags: &'a [TagDescriptor],
	options: &'a MetaOptions,
}

impl TagsText<'_> {
	/// The tags at the requested placement.
	pub fn text(&self, text_options: TextOptions) -> String {
		tags_text(self.tags, self.options, text_options)
	}

	/// Number of tags across every placement.
	pub fn len(&self) -> usize {
		self.tags.len()
	}

	/// Whether the field has no tags.
	pub fn is_empty(&self) -> bool {
		self.tags.is_empty()
	}
}

/// A view looked up by field name.
#[derive(Debug, Clone, Copy)]
pub enum FieldText<'a> {
	/// The title.
	Title(TitleText<'a>),
	/// An attribute bag.
	Attrs(AttrsText<'a>),
	/// An element field.
	Tags(TagsText<'a>),
}

impl FieldText<'_> {
	/// Renders with default options: head placement, no server-render marker.
	pub fn text(&self) -> String {
		match self {
			Self::Title(view) => view.text(),
			Self::Attrs(view) => view.text(false),
			Self::Tags(view) => view.text(TextOptions::new()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reinhardt_meta_core::{AttrMap, RawTag};
	use rstest::rstest;

	#[rstest]
	fn test_invalid_options_rejected() {
		let options = MetaOptions::new().attribute("");
		assert!(ServerInjector::generate(&RawMetaInfo::new(), &options).is_err());
	}

	#[rstest]
	fn test_field_lookup() {
		let injector = ServerInjector::generate(
			&RawMetaInfo::new()
				.title("Home")
				.html_attrs(AttrMap::new().with("lang", "en")),
			&MetaOptions::default(),
		)
		.unwrap();

		assert_eq!(injector.field("title").unwrap().text(), "<title>Home</title>");
		assert_eq!(
			injector.field("htmlAttrs").unwrap().text(),
			r#"lang="en" data-rh-meta="lang""#
		);
		assert_eq!(injector.field("link").unwrap().text(), "");
		assert!(injector.field("titleTemplate").is_none());
	}

	#[rstest]
	fn test_head_and_body_sections() {
		let injector = ServerInjector::generate(
			&RawMetaInfo::new()
				.title("T")
				.meta(RawTag::charset("utf-8"))
				.script(RawTag::script_src("/head.js"))
				.script(RawTag::script_src("/pre.js").pbody())
				.script(RawTag::script_src("/post.js").body())
				.noscript(RawTag::inline("no js").body()),
			&MetaOptions::default(),
		)
		.unwrap();

		let head = injector.head(true);
		assert_eq!(
			head,
			"<title>T</title>\n\
			 <meta data-rh-meta=\"ssr\" charset=\"utf-8\">\n\
			 <script data-rh-meta=\"ssr\" src=\"/head.js\"></script>\n"
		);
		assert_eq!(
			injector.body_prepend(false),
			r#"<script data-rh-meta="ssr" src="/pre.js" data-pbody="true"></script>"#
		);
		assert_eq!(
			injector.body_append(false),
			"<script data-rh-meta=\"ssr\" src=\"/post.js\" data-body=\"true\"></script>\
			 <noscript data-rh-meta=\"ssr\" data-body=\"true\">no js</noscript>"
		);
	}
}
