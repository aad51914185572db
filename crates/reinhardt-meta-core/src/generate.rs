//! Tag Generator.
//!
//! Turns a [`MergedMetaInfo`] into [`RenderInstructions`] that both the
//! server serializer and the client reconciler consume.
//!
//! Element attributes are emitted in a fixed order: the identifier attribute
//! (`data-{tag_id_key_name}`) first, then the declared attributes in
//! declaration order, then the placement attribute. The identifier always
//! leads, wherever the entry declared it, so keyed elements render the same
//! bytes whether they came from a builder or from JSON.

use crate::attr::{TagAttr, render_attributes};
use crate::descriptor::{
	AttrsInstruction, CONTENT_EXEMPTION, RenderInstructions, TagContent, TagDescriptor,
	TagIdentity, TitleInstruction, structural_digest,
};
use crate::field::{MetaField, Placement};
use crate::options::MetaOptions;
use crate::raw::{CONTENT_KEYS, RawTag};
use crate::resolve::MergedMetaInfo;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Value of the placement data attribute.
const PLACEMENT_VALUE: &str = "true";

/// Builds render instructions for `merged`.
pub fn generate(merged: &MergedMetaInfo, options: &MetaOptions) -> RenderInstructions {
	let title = TitleInstruction {
		text: merged.final_title(),
		escape: !merged.is_sanitizer_disabled(MetaField::Title),
	};

	let bags = MetaField::ATTRIBUTE_BAGS.map(|field| generate_attrs(merged, field));

	let mut tags = BTreeMap::new();
	tags.insert(MetaField::Base, generate_base(merged));
	for field in MetaField::LISTS {
		tags.insert(field, generate_list(merged, field, options));
	}

	RenderInstructions::new(title, bags, tags)
}

fn generate_attrs(merged: &MergedMetaInfo, field: MetaField) -> AttrsInstruction {
	let declared = merged.attrs(field);
	let attributes = declared.map(render_attributes).unwrap_or_default();
	let sanitize_disabled = if merged.is_sanitizer_disabled(field) {
		attributes.iter().map(|attr| attr.name.clone()).collect()
	} else {
		BTreeSet::new()
	};
	AttrsInstruction {
		field,
		declared: declared.is_some(),
		attributes,
		ssr_marker: field == MetaField::HtmlAttrs,
		sanitize_disabled,
	}
}

fn generate_base(merged: &MergedMetaInfo) -> Vec<TagDescriptor> {
	let Some(attributes) = merged
		.base
		.as_ref()
		.map(render_attributes)
		.filter(|attrs| !attrs.is_empty())
	else {
		return Vec::new();
	};

	let sanitize_disabled = if merged.is_sanitizer_disabled(MetaField::Base) {
		attributes.iter().map(|attr| attr.name.clone()).collect()
	} else {
		BTreeSet::new()
	};
	let digest = structural_digest(MetaField::Base.tag_name(), &attributes, None);
	vec![TagDescriptor {
		field: MetaField::Base,
		tag_name: MetaField::Base.tag_name(),
		attributes,
		content: None,
		placement: Placement::Head,
		identifier: None,
		identity: TagIdentity::Structural {
			digest,
			occurrence: 0,
		},
		render_once: false,
		sanitize_disabled,
		callback: None,
	}]
}

fn generate_list(
	merged: &MergedMetaInfo,
	field: MetaField,
	options: &MetaOptions,
) -> Vec<TagDescriptor> {
	let mut occurrences: HashMap<String, usize> = HashMap::new();

	merged
		.list(field)
		.iter()
		.filter(|tag| !tag.skip)
		.map(|tag| {
			let placement = placement_of(field, tag);
			let declared = declared_attributes(field, tag);
			let content = content_of(tag);

			let identity = match &tag.vmid {
				Some(vmid) => TagIdentity::Keyed(vmid.clone()),
				None => {
					let mut hashed = declared.clone();
					hashed.extend(placement_attribute(placement));
					let digest = structural_digest(
						field.tag_name(),
						&hashed,
						content.as_ref().map(TagContent::dom_text).as_deref(),
					);
					let rank = occurrences.entry(digest.clone()).or_insert(0);
					let occurrence = *rank;
					*rank += 1;
					TagIdentity::Structural { digest, occurrence }
				}
			};

			let mut attributes = Vec::with_capacity(declared.len() + 2);
			if let Some(vmid) = &tag.vmid {
				attributes.push(TagAttr::new(options.identifier_attribute(), vmid.clone()));
			}
			attributes.extend(declared);
			attributes.extend(placement_attribute(placement));

			let sanitize_disabled = sanitize_exemptions(merged, field, tag, &attributes);
			let callback = match field {
				MetaField::Script | MetaField::Link => tag.callback.clone(),
				_ => None,
			};

			TagDescriptor {
				field,
				tag_name: field.tag_name(),
				attributes,
				content,
				placement,
				identifier: tag.vmid.clone(),
				identity,
				render_once: tag.once,
				sanitize_disabled,
				callback,
			}
		})
		.collect()
}

fn placement_of(field: MetaField, tag: &RawTag) -> Placement {
	if !field.supports_body_placement() {
		return Placement::Head;
	}
	if tag.pbody {
		Placement::BodyPrepend
	} else if tag.body {
		Placement::BodyAppend
	} else {
		Placement::Head
	}
}

fn placement_attribute(placement: Placement) -> Option<TagAttr> {
	placement
		.data_attribute()
		.map(|name| TagAttr::new(name, PLACEMENT_VALUE))
}

fn declared_attributes(field: MetaField, tag: &RawTag) -> Vec<TagAttr> {
	let mut attributes = render_attributes(&tag.attrs);
	if field == MetaField::Meta
		&& let Some(template) = &tag.template
	{
		for attr in attributes.iter_mut().filter(|attr| attr.name == "content") {
			if let Some(value) = &attr.value {
				attr.value = Some(template.apply(value));
			}
		}
	}
	attributes
}

fn content_of(tag: &RawTag) -> Option<TagContent> {
	if let Some(json) = &tag.json {
		return Some(TagContent::Json(json.to_string()));
	}
	tag.content
		.as_ref()
		.filter(|content| !content.is_empty())
		.map(|content| TagContent::Text(content.clone()))
}

fn sanitize_exemptions(
	merged: &MergedMetaInfo,
	field: MetaField,
	tag: &RawTag,
	attributes: &[TagAttr],
) -> BTreeSet<String> {
	let mut exempt = BTreeSet::new();
	if merged.is_sanitizer_disabled(field) {
		exempt.extend(attributes.iter().map(|attr| attr.name.clone()));
		exempt.insert(CONTENT_EXEMPTION.to_string());
	}
	if let Some(names) = tag
		.vmid
		.as_ref()
		.and_then(|vmid| merged.disable_sanitizers_by_tag_id.get(vmid))
	{
		for name in names {
			if CONTENT_KEYS.contains(&name.as_str()) {
				exempt.insert(CONTENT_EXEMPTION.to_string());
			} else {
				exempt.insert(name.clone());
			}
		}
	}
	exempt
}
