//! Merge Resolver.
//!
//! Folds the root-first list of component declarations into one
//! [`MergedMetaInfo`]. Descendants override ancestors:
//!
//! - `title`: the closest-to-leaf non-empty title wins.
//! - `titleTemplate` and the hooks: the closest-to-leaf declared value wins.
//! - attribute bags and `base`: shallow merge, per key.
//! - list fields: keyed entries replace the earlier entry with the same
//!   identifier at its position, unkeyed entries are appended subject to the
//!   field's [`DuplicatePolicy`].
//!
//! Malformed list entries are dropped.

use crate::attr::AttrMap;
use crate::field::MetaField;
use crate::options::{DuplicatePolicy, MergePolicy};
use crate::raw::{AfterNavigationHook, ChangedHook, RawMetaInfo, RawTag};
use crate::template::{Template, apply_template};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// The result of folding a component tree's declarations.
#[derive(Debug, Clone, Default)]
pub struct MergedMetaInfo {
	/// The winning raw title, never empty.
	pub title: Option<String>,
	/// The winning title template.
	pub title_template: Option<Template>,
	/// Merged `<html>` attributes. `Some` when any component declared them.
	pub html_attrs: Option<AttrMap>,
	/// Merged `<head>` attributes.
	pub head_attrs: Option<AttrMap>,
	/// Merged `<body>` attributes.
	pub body_attrs: Option<AttrMap>,
	/// Merged `<base>` attributes.
	pub base: Option<AttrMap>,
	/// Merged `<meta>` entries.
	pub meta: Vec<RawTag>,
	/// Merged `<link>` entries.
	pub link: Vec<RawTag>,
	/// Merged `<style>` entries.
	pub style: Vec<RawTag>,
	/// Merged `<script>` entries.
	pub script: Vec<RawTag>,
	/// Merged `<noscript>` entries.
	pub noscript: Vec<RawTag>,
	/// Union of every component's unescaped fields.
	pub disable_sanitizers: BTreeSet<String>,
	/// Union of every component's per-identifier exemptions.
	pub disable_sanitizers_by_tag_id: BTreeMap<String, BTreeSet<String>>,
	/// The closest-to-leaf `changed` hook.
	pub changed: Option<ChangedHook>,
	/// The closest-to-leaf `afterNavigation` hook.
	pub after_navigation: Option<AfterNavigationHook>,
}

impl MergedMetaInfo {
	/// The title after applying the template. Empty titles stay empty.
	pub fn final_title(&self) -> String {
		match &self.title {
			Some(title) => apply_template(self.title_template.as_ref(), title),
			None => String::new(),
		}
	}

	/// The merged entries of a list field.
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

	/// The merged attribute map of an attribute bag or of `base`.
	pub fn attrs(&self, field: MetaField) -> Option<&AttrMap> {
		match field {
			MetaField::HtmlAttrs => self.html_attrs.as_ref(),
			MetaField::HeadAttrs => self.head_attrs.as_ref(),
			MetaField::BodyAttrs => self.body_attrs.as_ref(),
			MetaField::Base => self.base.as_ref(),
			_ => None,
		}
	}

	/// Whether a field's values are emitted unescaped.
	pub fn is_sanitizer_disabled(&self, field: MetaField) -> bool {
		self.disable_sanitizers.contains(field.name())
	}

	fn list_mut(&mut self, field: MetaField) -> Option<&mut Vec<RawTag>> {
		match field {
			MetaField::Meta => Some(&mut self.meta),
			MetaField::Link => Some(&mut self.link),
			MetaField::Style => Some(&mut self.style),
			MetaField::Script => Some(&mut self.script),
			MetaField::Noscript => Some(&mut self.noscript),
			_ => None,
		}
	}

	fn attrs_mut(&mut self, field: MetaField) -> Option<&mut Option<AttrMap>> {
		match field {
			MetaField::HtmlAttrs => Some(&mut self.html_attrs),
			MetaField::HeadAttrs => Some(&mut self.head_attrs),
			MetaField::BodyAttrs => Some(&mut self.body_attrs),
			MetaField::Base => Some(&mut self.base),
			_ => None,
		}
	}
}

/// Folds declarations with an explicit [`MergePolicy`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolver {
	policy: MergePolicy,
}

impl Resolver {
	/// A resolver using the default policy.
	pub fn new() -> Self {
		Self::default()
	}

	/// A resolver using `policy` for unkeyed duplicates.
	pub fn with_policy(policy: MergePolicy) -> Self {
		Self { policy }
	}

	/// The active policy.
	pub fn policy(&self) -> &MergePolicy {
		&self.policy
	}

	/// Folds `infos`, ordered root first and leaf last.
	pub fn resolve(&self, infos: &[RawMetaInfo]) -> MergedMetaInfo {
		let mut merged = MergedMetaInfo::default();

		for info in infos {
			if let Some(title) = info.title.as_deref().filter(|t| !t.is_empty()) {
				merged.title = Some(title.to_string());
			}
			if let Some(template) = &info.title_template {
				merged.title_template = Some(template.clone());
			}
			if let Some(hook) = &info.changed {
				merged.changed = Some(hook.clone());
			}
			if let Some(hook) = &info.after_navigation {
				merged.after_navigation = Some(hook.clone());
			}

			for field in MetaField::ATTRIBUTE_BAGS.into_iter().chain([MetaField::Base]) {
				let (Some(declared), Some(slot)) = (info.attrs(field), merged.attrs_mut(field)) else {
					continue;
				};
				slot.get_or_insert_with(AttrMap::new).merge(declared);
			}

			merged
				.disable_sanitizers
				.extend(info.disable_sanitizers.iter().cloned());
			for (vmid, names) in &info.disable_sanitizers_by_tag_id {
				merged
					.disable_sanitizers_by_tag_id
					.entry(vmid.clone())
					.or_default()
					.extend(names.iter().cloned());
			}
		}

		for field in MetaField::LISTS {
			let entries = self.merge_list(field, infos);
			if let Some(slot) = merged.list_mut(field) {
				*slot = entries;
			}
		}

		merged
	}

	fn merge_list(&self, field: MetaField, infos: &[RawMetaInfo]) -> Vec<RawTag> {
		let collapse = self.policy.for_field(field) == DuplicatePolicy::Collapse;
		let mut merged: Vec<RawTag> = Vec::new();
		let mut seen_unkeyed: HashSet<String> = HashSet::new();

		for tag in infos.iter().flat_map(|info| info.list(field)) {
			if tag.is_empty() {
				continue;
			}
			if !tag.is_well_formed(field) {
				tracing::debug!(field = %field, vmid = ?tag.vmid, "dropping malformed entry");
				continue;
			}

			let Some(vmid) = tag.vmid.as_deref() else {
				if collapse && !seen_unkeyed.insert(tag.canonical_key()) {
					tracing::trace!(field = %field, "collapsing duplicate unkeyed entry");
					continue;
				}
				merged.push(tag.clone());
				continue;
			};

			let existing = merged
				.iter()
				.position(|earlier| earlier.vmid.as_deref() == Some(vmid));
			match (existing, tag.removal) {
				(Some(pos), true) => {
					tracing::trace!(field = %field, vmid, "removing keyed entry");
					merged.remove(pos);
				}
				(None, true) => {
					tracing::trace!(field = %field, vmid, "nothing to remove for keyed entry");
				}
				(Some(pos), false) => {
					tracing::trace!(field = %field, vmid, "overriding keyed entry");
					let mut replacement = tag.clone();
					if replacement.template.is_none() {
						replacement.template = merged[pos].template.clone();
					}
					merged[pos] = replacement;
				}
				(None, false) => merged.push(tag.clone()),
			}
		}

		merged
	}
}

/// Folds `infos` with the default [`MergePolicy`].
pub fn resolve(infos: &[RawMetaInfo]) -> MergedMetaInfo {
	Resolver::new().resolve(infos)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attr::AttrValue;
	use rstest::rstest;

	fn names(tags: &[RawTag]) -> Vec<String> {
		tags.iter()
			.map(|tag| {
				tag.attrs
					.get("content")
					.or_else(|| tag.attrs.get("src"))
					.map(AttrValue::to_value_string)
					.or_else(|| tag.content.clone())
					.unwrap_or_default()
			})
			.collect()
	}

	#[rstest]
	fn test_empty_list_resolves_to_empty() {
		let merged = resolve(&[]);
		assert_eq!(merged.final_title(), "");
		assert!(merged.html_attrs.is_none());
		for field in MetaField::LISTS {
			assert!(merged.list(field).is_empty());
		}
	}

	#[rstest]
	fn test_closest_non_empty_title_wins() {
		let merged = resolve(&[
			RawMetaInfo::new().title("Root").title_template("%s | Site"),
			RawMetaInfo::new().title("Page"),
			RawMetaInfo::new().title(""),
		]);
		assert_eq!(merged.title.as_deref(), Some("Page"));
		assert_eq!(merged.final_title(), "Page | Site");
	}

	#[rstest]
	fn test_template_never_runs_on_missing_title() {
		let merged = resolve(&[RawMetaInfo::new().title_template("%s | Site")]);
		assert_eq!(merged.final_title(), "");
	}

	#[rstest]
	fn test_closest_template_wins() {
		let merged = resolve(&[
			RawMetaInfo::new().title("A").title_template("%s | Root"),
			RawMetaInfo::new().title_template(Template::func(|t| t.to_uppercase())),
		]);
		assert_eq!(merged.final_title(), "A");
		let merged = resolve(&[
			RawMetaInfo::new().title("abc").title_template("%s | Root"),
			RawMetaInfo::new().title_template(Template::func(|t| t.to_uppercase())),
		]);
		assert_eq!(merged.final_title(), "ABC");
	}

	#[rstest]
	fn test_attribute_bags_shallow_merge() {
		let merged = resolve(&[
			RawMetaInfo::new().html_attrs(AttrMap::new().with("lang", "en").with("dir", "ltr")),
			RawMetaInfo::new().html_attrs(AttrMap::new().with("lang", "fr")),
			RawMetaInfo::new().body_attrs(AttrMap::new()),
		]);
		let html = merged.html_attrs.unwrap();
		assert_eq!(html.get("lang"), Some(&AttrValue::from("fr")));
		assert_eq!(html.get("dir"), Some(&AttrValue::from("ltr")));
		assert!(merged.body_attrs.unwrap().is_empty());
		assert!(merged.head_attrs.is_none());
	}

	#[rstest]
	fn test_keyed_entry_replaced_at_first_position() {
		let merged = resolve(&[
			RawMetaInfo::new()
				.meta(RawTag::meta_name("description", "root").vmid("desc"))
				.meta(RawTag::meta_name("author", "someone")),
			RawMetaInfo::new().meta(RawTag::meta_property("og:description", "leaf").vmid("desc")),
		]);
		assert_eq!(names(&merged.meta), vec!["leaf", "someone"]);
		assert!(merged.meta[0].attrs.contains("property"));
		assert!(!merged.meta[0].attrs.contains("name"));
	}

	#[rstest]
	fn test_keyed_override_inherits_template() {
		let merged = resolve(&[
			RawMetaInfo::new().meta(
				RawTag::meta_name("description", "root")
					.vmid("desc")
					.template("%s - Site"),
			),
			RawMetaInfo::new().meta(RawTag::meta_name("description", "leaf").vmid("desc")),
		]);
		assert_eq!(merged.meta[0].template, Some(Template::pattern("%s - Site")));
	}

	#[rstest]
	fn test_keyed_removal() {
		let merged = resolve(&[
			RawMetaInfo::new()
				.meta(RawTag::meta_name("description", "root").vmid("desc"))
				.meta(RawTag::charset("utf-8")),
			RawMetaInfo::new().meta(RawTag::remove("desc")),
			RawMetaInfo::new().meta(RawTag::remove("unknown")),
		]);
		assert_eq!(merged.meta.len(), 1);
		assert!(merged.meta[0].attrs.contains("charset"));
	}

	#[rstest]
	fn test_malformed_entries_dropped() {
		let merged = resolve(&[RawMetaInfo::new()
			.meta(RawTag::new().attr("content", "orphan"))
			.meta(RawTag::new())
			.link(RawTag::new().attr("media", "print"))
			.script(RawTag::script_src("/ok.js"))]);
		assert!(merged.meta.is_empty());
		assert!(merged.link.is_empty());
		assert_eq!(merged.script.len(), 1);
	}

	#[rstest]
	fn test_default_policy_collapses_scripts_keeps_meta() {
		let info = RawMetaInfo::new()
			.meta(RawTag::meta_name("robots", "index"))
			.script(RawTag::script_src("/a.js"));
		let merged = resolve(&[info.clone(), info]);
		assert_eq!(merged.meta.len(), 2);
		assert_eq!(merged.script.len(), 1);
	}

	#[rstest]
	#[case(DuplicatePolicy::Keep, 2)]
	#[case(DuplicatePolicy::Collapse, 1)]
	fn test_configurable_duplicate_policy(#[case] policy: DuplicatePolicy, #[case] expected: usize) {
		let info = RawMetaInfo::new().style(RawTag::inline("body{}"));
		let resolver = Resolver::with_policy(MergePolicy::default().with(MetaField::Style, policy));
		let merged = resolver.resolve(&[info.clone(), info]);
		assert_eq!(merged.style.len(), expected);
	}

	#[rstest]
	fn test_collapse_only_touches_unkeyed() {
		let merged = resolve(&[RawMetaInfo::new()
			.script(RawTag::script_src("/a.js"))
			.script(RawTag::script_src("/a.js").body())]);
		assert_eq!(merged.script.len(), 2);
	}

	#[rstest]
	fn test_sanitizer_exemptions_accumulate() {
		let merged = resolve(&[
			RawMetaInfo::new().disable_sanitizer("script"),
			RawMetaInfo::new()
				.disable_sanitizer_for("ld", "innerHTML")
				.disable_sanitizer_for("ld", "src"),
		]);
		assert!(merged.is_sanitizer_disabled(MetaField::Script));
		assert!(!merged.is_sanitizer_disabled(MetaField::Style));
		assert_eq!(merged.disable_sanitizers_by_tag_id["ld"].len(), 2);
	}

	#[rstest]
	fn test_closest_hook_wins() {
		use std::sync::Arc;
		use std::sync::atomic::{AtomicUsize, Ordering};

		let calls = Arc::new(AtomicUsize::new(0));
		let leaf_calls = Arc::clone(&calls);
		let merged = resolve(&[
			RawMetaInfo::new().on_after_navigation(|_| panic!("root hook must be overridden")),
			RawMetaInfo::new().on_after_navigation(move |_| {
				leaf_calls.fetch_add(1, Ordering::SeqCst);
			}),
		]);
		let hook = merged.after_navigation.clone().unwrap();
		hook.call(&merged);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}
}
