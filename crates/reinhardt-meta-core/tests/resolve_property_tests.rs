//! Property-based tests for the merge resolver and the tag generator.

use proptest::prelude::*;
use reinhardt_meta_core::prelude::*;

fn arb_tag() -> impl Strategy<Value = RawTag> {
	(
		prop::option::of("[a-c]"),
		"[a-z]{1,6}",
		"[a-z ]{0,8}",
		any::<bool>(),
	)
		.prop_map(|(vmid, name, content, once)| {
			let mut tag = RawTag::meta_name(name, content);
			tag.vmid = vmid;
			tag.once = once;
			tag
		})
}

fn arb_script() -> impl Strategy<Value = RawTag> {
	("/[a-c]\\.js", 0u8..3).prop_map(|(src, placement)| {
		let tag = RawTag::script_src(src);
		match placement {
			0 => tag,
			1 => tag.body(),
			_ => tag.pbody(),
		}
	})
}

fn arb_info() -> impl Strategy<Value = RawMetaInfo> {
	(
		prop::option::of("[A-Za-z ]{0,10}"),
		prop::collection::vec(arb_tag(), 0..4),
		prop::collection::vec(arb_script(), 0..3),
	)
		.prop_map(|(title, meta, script)| RawMetaInfo {
			title,
			meta,
			script,
			..RawMetaInfo::default()
		})
}

proptest! {
	/// Property: resolving and generating twice yields identical instructions
	#[test]
	fn prop_resolve_generate_deterministic(infos in prop::collection::vec(arb_info(), 0..5)) {
		let options = MetaOptions::default();
		let first = generate(&resolve(&infos), &options);
		let second = generate(&resolve(&infos), &options);

		prop_assert_eq!(first, second);
	}

	/// Property: every identifier appears at most once after merging
	#[test]
	fn prop_identifiers_unique(infos in prop::collection::vec(arb_info(), 0..5)) {
		let merged = resolve(&infos);
		let mut seen = std::collections::HashSet::new();
		for tag in &merged.meta {
			if let Some(vmid) = &tag.vmid {
				prop_assert!(seen.insert(vmid.clone()), "duplicate vmid {}", vmid);
			}
		}
	}

	/// Property: identities within a field are unique
	#[test]
	fn prop_identities_unique(infos in prop::collection::vec(arb_info(), 0..5)) {
		let instructions = generate(&resolve(&infos), &MetaOptions::default());
		for field in MetaField::ELEMENTS {
			let mut seen = std::collections::HashSet::new();
			for tag in instructions.tags(field) {
				prop_assert!(seen.insert(tag.identity.clone()));
			}
		}
	}

	/// Property: the final title is the template applied to the last non-empty title
	#[test]
	fn prop_closest_non_empty_title(infos in prop::collection::vec(arb_info(), 0..5)) {
		let expected = infos
			.iter()
			.rev()
			.find_map(|info| info.title.clone().filter(|t| !t.is_empty()))
			.unwrap_or_default();

		prop_assert_eq!(resolve(&infos).final_title(), expected);
	}

	/// Property: a keyed entry lands where the identifier first appeared
	#[test]
	fn prop_keyed_override_keeps_first_position(
		prefix in prop::collection::vec(arb_script(), 0..3),
		content in "[a-z]{1,5}",
	) {
		let root = RawMetaInfo::new()
			.meta(RawTag::meta_name("first", "x"))
			.meta(RawTag::meta_name("description", "root").vmid("d"))
			.meta(RawTag::meta_name("last", "y"));
		let mut leaf = RawMetaInfo::new().meta(RawTag::meta_name("description", content.clone()).vmid("d"));
		leaf.script = prefix;

		let merged = resolve(&[root, leaf]);

		prop_assert_eq!(merged.meta.len(), 3);
		prop_assert_eq!(merged.meta[1].vmid.as_deref(), Some("d"));
		prop_assert_eq!(
			merged.meta[1].attrs.get("content").map(AttrValue::to_value_string),
			Some(content)
		);
	}
}
