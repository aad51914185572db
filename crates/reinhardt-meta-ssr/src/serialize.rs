//! Server Serializer.
//!
//! Renders [`RenderInstructions`](reinhardt_meta_core::RenderInstructions)
//! to markup. Output is a pure function of its input: the same instructions
//! and options always produce the same bytes.
//!
//! Every element carries the marker attribute first, valued with the
//! server app id, so the client adopts it on mount:
//!
//! ```text
//! <meta data-rh-meta="ssr" charset="utf-8">
//! ```
//!
//! Render-once elements carry the marker valued `once` instead, which the
//! client never removes.
//!
//! Attribute bags list their attributes followed by the marker attribute,
//! whose value names the managed attributes. `<html>` can additionally be
//! given the server-render marker.

use crate::escape::escape_if;
use reinhardt_meta_core::descriptor::{CONTENT_EXEMPTION, ONCE_MARKER_VALUE};
use reinhardt_meta_core::{
	AttrsInstruction, MetaOptions, Placement, TagAttr, TagContent, TagDescriptor,
	TitleInstruction,
};

/// Attribute the server adds to callback-bearing elements. The client reads
/// the flag to tell that the element already loaded.
pub const LOADED_ATTRIBUTE: &str = "onload";

/// Value of [`LOADED_ATTRIBUTE`].
pub const LOADED_FLAG: &str = "this.__vm_l=1";

/// Selects which tags a `text` call emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
	/// Placement to emit.
	pub placement: Placement,
	/// Append a line break after every tag.
	pub ln: bool,
}

impl TextOptions {
	/// Head placement, no line breaks.
	pub fn new() -> Self {
		Self::default()
	}

	/// Tags appended to the body.
	pub fn body() -> Self {
		Self {
			placement: Placement::BodyAppend,
			ln: false,
		}
	}

	/// Tags prepended to the body.
	pub fn pbody() -> Self {
		Self {
			placement: Placement::BodyPrepend,
			ln: false,
		}
	}

	/// Enables line breaks.
	pub fn ln(mut self) -> Self {
		self.ln = true;
		self
	}

	/// Sets line breaks explicitly.
	pub fn with_ln(mut self, ln: bool) -> Self {
		self.ln = ln;
		self
	}
}

impl From<Placement> for TextOptions {
	fn from(placement: Placement) -> Self {
		Self {
			placement,
			ln: false,
		}
	}
}

/// Renders the title element. An empty title renders nothing.
pub fn title_text(title: &TitleInstruction) -> String {
	if title.is_empty() {
		return String::new();
	}
	format!("<title>{}</title>", escape_if(&title.text, !title.escape))
}

/// Renders the inside of an attribute bag's start tag.
pub fn attrs_text(bag: &AttrsInstruction, options: &MetaOptions, add_ssr_attribute: bool) -> String {
	let mut parts: Vec<String> = Vec::with_capacity(bag.attributes.len() + 2);
	if add_ssr_attribute && bag.ssr_marker {
		parts.push(options.ssr_attribute.clone());
	}
	for attr in &bag.attributes {
		parts.push(attribute_text(attr, bag.sanitize_disabled.contains(&attr.name)));
	}
	if !bag.is_empty() {
		parts.push(format!("{}=\"{}\"", options.attribute, bag.managed_names()));
	}
	parts.join(" ")
}

/// Renders every tag of `tags` at the placement `text_options` selects.
pub fn tags_text(tags: &[TagDescriptor], options: &MetaOptions, text_options: TextOptions) -> String {
	let mut out = String::new();
	for tag in tags
		.iter()
		.filter(|tag| tag.placement == text_options.placement)
	{
		out.push_str(&tag_text(tag, options));
		if text_options.ln {
			out.push('\n');
		}
	}
	out
}

/// Renders one element.
pub fn tag_text(tag: &TagDescriptor, options: &MetaOptions) -> String {
	let marker = if tag.render_once {
		ONCE_MARKER_VALUE
	} else {
		options.ssr_app_id.as_str()
	};
	let mut out = format!(
		"<{} {}=\"{}\"",
		tag.tag_name,
		options.attribute,
		escape_if(marker, false)
	);
	for attr in &tag.attributes {
		out.push(' ');
		out.push_str(&attribute_text(attr, tag.is_sanitize_disabled(&attr.name)));
	}
	if tag.callback.is_some() {
		out.push_str(&format!(" {}=\"{}\"", LOADED_ATTRIBUTE, LOADED_FLAG));
	}
	out.push('>');

	if tag.field.is_void() {
		return out;
	}
	match &tag.content {
		Some(TagContent::Text(text)) => {
			out.push_str(&escape_if(text, tag.is_sanitize_disabled(CONTENT_EXEMPTION)));
		}
		Some(json @ TagContent::Json(_)) => out.push_str(&json.dom_text()),
		None => {}
	}
	out.push_str(&format!("</{}>", tag.tag_name));
	out
}

fn attribute_text(attr: &TagAttr, raw: bool) -> String {
	match &attr.value {
		Some(value) => format!("{}=\"{}\"", attr.name, escape_if(value, raw)),
		None => attr.name.clone(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reinhardt_meta_core::prelude::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn options() -> MetaOptions {
		MetaOptions::new().attribute("data-vue-meta")
	}

	fn build(infos: &[RawMetaInfo], options: &MetaOptions) -> RenderInstructions {
		generate(&resolve(infos), options)
	}

	#[rstest]
	fn test_title_escaped(options: MetaOptions) {
		let out = build(&[RawMetaInfo::new().title("Fish & Chips")], &options);
		assert_eq!(title_text(&out.title), "<title>Fish &amp; Chips</title>");
	}

	#[rstest]
	fn test_title_unescaped_when_disabled(options: MetaOptions) {
		let out = build(
			&[RawMetaInfo::new().title("<b>x</b>").disable_sanitizer("title")],
			&options,
		);
		assert_eq!(title_text(&out.title), "<title><b>x</b></title>");
	}

	#[rstest]
	fn test_meta_marker_first(options: MetaOptions) {
		let out = build(&[RawMetaInfo::new().meta(RawTag::charset("utf-8"))], &options);
		assert_eq!(
			tags_text(out.tags(MetaField::Meta), &options, TextOptions::new()),
			r#"<meta data-vue-meta="ssr" charset="utf-8">"#
		);
	}

	#[rstest]
	fn test_render_once_uses_once_marker(options: MetaOptions) {
		let out = build(
			&[RawMetaInfo::new()
				.script(RawTag::inline("boot()").vmid("boot").once())
				.script(RawTag::inline("run()").vmid("run"))],
			&options,
		);
		assert_eq!(
			tags_text(out.tags(MetaField::Script), &options, TextOptions::new()),
			concat!(
				r#"<script data-vue-meta="once" data-vmid="boot">boot()</script>"#,
				r#"<script data-vue-meta="ssr" data-vmid="run">run()</script>"#,
			)
		);
	}

	#[rstest]
	fn test_attrs_bag_with_values(options: MetaOptions) {
		let out = build(
			&[RawMetaInfo::new().html_attrs(AttrMap::new().with("lang", "en").with("amp", true))],
			&options,
		);
		assert_eq!(
			attrs_text(&out.html_attrs, &options, true),
			r#"data-rh-meta-ssr lang="en" amp data-vue-meta="amp,lang""#
		);
		assert_eq!(
			attrs_text(&out.html_attrs, &options, false),
			r#"lang="en" amp data-vue-meta="amp,lang""#
		);
	}

	#[rstest]
	fn test_callback_marks_loaded(options: MetaOptions) {
		let out = build(
			&[RawMetaInfo::new().script(RawTag::script_src("/a.js").callback(|| {}))],
			&options,
		);
		assert_eq!(
			tags_text(out.tags(MetaField::Script), &options, TextOptions::new()),
			r#"<script data-vue-meta="ssr" src="/a.js" onload="this.__vm_l=1"></script>"#
		);
	}

	#[rstest]
	fn test_content_escaping(options: MetaOptions) {
		let out = build(
			&[RawMetaInfo::new()
				.noscript(RawTag::inline("<img src=x>"))
				.style(RawTag::inline("a > b {}").vmid("raw"))
				.disable_sanitizer_for("raw", "cssText")],
			&options,
		);
		assert_eq!(
			tags_text(out.tags(MetaField::Noscript), &options, TextOptions::new()),
			r#"<noscript data-vue-meta="ssr">&lt;img src=x&gt;</noscript>"#
		);
		assert_eq!(
			tags_text(out.tags(MetaField::Style), &options, TextOptions::new()),
			r#"<style data-vue-meta="ssr" data-vmid="raw">a > b {}</style>"#
		);
	}

	#[rstest]
	fn test_ln_appends_line_breaks(options: MetaOptions) {
		let out = build(
			&[RawMetaInfo::new()
				.meta(RawTag::charset("utf-8"))
				.meta(RawTag::meta_name("robots", "index"))],
			&options,
		);
		let text = tags_text(out.tags(MetaField::Meta), &options, TextOptions::new().ln());
		assert_eq!(text.lines().count(), 2);
		assert!(text.ends_with('\n'));
	}

	#[rstest]
	fn test_boolean_attribute_bare(options: MetaOptions) {
		let out = build(
			&[RawMetaInfo::new().script(
				RawTag::script_src("/a.js")
					.attr("async", true)
					.attr("defer", false),
			)],
			&options,
		);
		assert_eq!(
			tags_text(out.tags(MetaField::Script), &options, TextOptions::new()),
			r#"<script data-vue-meta="ssr" src="/a.js" async></script>"#
		);
	}
}
