//! Client Reconciler.
//!
//! Applies [`RenderInstructions`] to a live document with the fewest
//! mutations that make it match:
//!
//! - tags are matched to the previous cycle's records by [`TagKey`];
//! - matched tags whose output changed are updated in place, never
//!   recreated, so a script never runs twice;
//! - new tags are created, tags no longer desired are removed;
//! - render-once tags are never touched again after they first exist;
//! - attribute bags are applied to the existing `<html>`, `<head>` and
//!   `<body>` elements, removing only the attributes a previous cycle set.
//!
//! On the first cycle over a server-rendered document (`<html>` carries the
//! server-render marker), elements the server emitted are adopted instead
//! of recreated. Server elements marked render-once are adopted as
//! render-once records even when the first resolve no longer declares them.

use crate::callbacks::CallbackGuard;
use crate::dom::{DomTarget, MetaDom};
use reinhardt_meta_core::attr::is_boolean_attribute;
pub use reinhardt_meta_core::descriptor::CLIENT_MARKER_VALUE;
use reinhardt_meta_core::descriptor::{ONCE_MARKER_VALUE, structural_digest};
use reinhardt_meta_core::{
	AttrsInstruction, MetaError, MetaField, MetaOptions, MetaResult, Placement, RenderInstructions,
	TagAttr, TagContent, TagDescriptor, TagIdentity, TagKey, TitleInstruction,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Attribute the server uses to flag loaded elements. Left alone on update.
const LOADED_ATTRIBUTE: &str = "onload";

/// Tags added and removed by one cycle, with their elements.
///
/// Removed elements are already detached when the cycle returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChanges<N> {
	/// Tags created by the cycle.
	pub added: Vec<(TagKey, N)>,
	/// Tags removed by the cycle.
	pub removed: Vec<(TagKey, N)>,
}

impl<N> Default for TagChanges<N> {
	fn default() -> Self {
		Self {
			added: Vec::new(),
			removed: Vec::new(),
		}
	}
}

impl<N> TagChanges<N> {
	/// Whether the cycle added and removed nothing.
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty()
	}

	/// Keys of the created tags, in creation order.
	pub fn added_keys(&self) -> Vec<TagKey> {
		self.added.iter().map(|(key, _)| key.clone()).collect()
	}

	/// Keys of the removed tags, in removal order.
	pub fn removed_keys(&self) -> Vec<TagKey> {
		self.removed.iter().map(|(key, _)| key.clone()).collect()
	}
}

struct TagRecord<N> {
	node: N,
	fingerprint: String,
	placement: Placement,
	render_once: bool,
	guard: Option<CallbackGuard>,
}

struct Targets<N> {
	html: N,
	head: N,
	body: N,
}

impl<N> Targets<N> {
	fn parent(&self, placement: Placement) -> &N {
		match placement {
			Placement::Head => &self.head,
			Placement::BodyPrepend | Placement::BodyAppend => &self.body,
		}
	}

	fn bag(&self, field: MetaField) -> &N {
		match field {
			MetaField::HeadAttrs => &self.head,
			MetaField::BodyAttrs => &self.body,
			_ => &self.html,
		}
	}
}

struct ServerTag<N> {
	node: N,
	placement: Placement,
	once: bool,
}

/// Elements the server rendered, waiting to be adopted.
struct ServerTags<N> {
	by_key: BTreeMap<TagKey, ServerTag<N>>,
	duplicates: Vec<(TagKey, ServerTag<N>)>,
}

/// Owns the DOM tag records of one document.
pub struct Reconciler<D: MetaDom> {
	options: MetaOptions,
	records: BTreeMap<TagKey, TagRecord<D::Node>>,
	pending: Vec<CallbackGuard>,
	mounted: bool,
}

impl<D: MetaDom> Reconciler<D> {
	/// Creates a reconciler that has not run yet.
	pub fn new(options: MetaOptions) -> Self {
		Self {
			options,
			records: BTreeMap::new(),
			pending: Vec::new(),
			mounted: false,
		}
	}

	/// The active options.
	pub fn options(&self) -> &MetaOptions {
		&self.options
	}

	/// Whether a cycle completed.
	pub fn is_mounted(&self) -> bool {
		self.mounted
	}

	/// Keys of every managed tag.
	pub fn keys(&self) -> impl Iterator<Item = &TagKey> {
		self.records.keys()
	}

	/// The element managed under `key`.
	pub fn node(&self, key: &TagKey) -> Option<&D::Node> {
		self.records.get(key).map(|record| &record.node)
	}

	/// Number of callbacks still waiting for their element.
	pub fn pending_callbacks(&self) -> usize {
		self.pending.iter().filter(|guard| !guard.is_settled()).count()
	}

	/// Brings `dom` in line with `instructions`.
	///
	/// Fails without touching the document when `<html>`, `<head>` or
	/// `<body>` is missing.
	pub fn apply(
		&mut self,
		dom: &mut D,
		instructions: &RenderInstructions,
	) -> MetaResult<TagChanges<D::Node>> {
		let targets = resolve_targets(dom)?;
		let mut changes = TagChanges::default();

		let hydrating = !self.mounted
			&& dom
				.get_attribute(&targets.html, &self.options.ssr_attribute)
				.is_some();
		let mut server = if hydrating {
			self.collect_server_tags(dom, &targets)
		} else {
			ServerTags {
				by_key: BTreeMap::new(),
				duplicates: Vec::new(),
			}
		};

		sync_title(dom, &instructions.title);
		for field in MetaField::ATTRIBUTE_BAGS {
			if let Some(bag) = instructions.attrs(field) {
				sync_attrs(dom, targets.bag(field), bag, &self.options.attribute);
			}
		}

		let mut desired = BTreeSet::new();
		let mut prepend = Vec::new();
		let mut immediate = Vec::new();

		for tag in instructions.all_tags() {
			let key = tag.key();
			desired.insert(key.clone());

			if let Some(record) = self.records.get_mut(&key) {
				if record.render_once {
					continue;
				}
				if dom.is_connected(&record.node) {
					let fingerprint = tag.fingerprint();
					if record.fingerprint != fingerprint {
						tracing::trace!(tag = %key, "updating tag in place");
						update_element(dom, &record.node, tag, &self.options.attribute);
						record.fingerprint = fingerprint;
					}
					if record.placement != tag.placement {
						insert(dom, &targets, &record.node, tag.placement);
						record.placement = tag.placement;
					}
					continue;
				}
				tracing::debug!(tag = %key, "recreating detached tag");
				if let Some(guard) = self.records.remove(&key).and_then(|record| record.guard) {
					guard.abandon();
				}
			}

			if let Some(ServerTag { node, once, .. }) = server.by_key.remove(&key) {
				tracing::debug!(tag = %key, "adopting server-rendered tag");
				let render_once = once || tag.render_once;
				if !render_once && !element_matches(dom, &node, tag, &self.options.attribute) {
					update_element(dom, &node, tag, &self.options.attribute);
				}
				let guard = tag.callback.as_ref().map(|callback| {
					let guard = CallbackGuard::new(key.clone(), callback.clone());
					if dom.is_loaded(&node) {
						guard.fire();
					} else {
						let listener = guard.clone();
						dom.add_load_listener(&node, Box::new(move || {
							listener.fire();
						}));
						self.pending.push(guard.clone());
					}
					guard
				});
				let mut adopted = record(node, tag, guard);
				adopted.render_once = render_once;
				self.records.insert(key, adopted);
				continue;
			}

			let Some(node) = create_element(dom, tag, &self.options.attribute) else {
				tracing::warn!(tag = %key, "document refused to create element");
				continue;
			};
			let guard = tag.callback.as_ref().map(|callback| {
				let guard = CallbackGuard::new(key.clone(), callback.clone());
				if loads_over_network(tag) {
					let listener = guard.clone();
					dom.add_load_listener(&node, Box::new(move || {
						listener.fire();
					}));
					self.pending.push(guard.clone());
				} else {
					immediate.push(guard.clone());
				}
				guard
			});
			if tag.placement == Placement::BodyPrepend {
				prepend.push(node.clone());
			} else {
				insert(dom, &targets, &node, tag.placement);
			}
			self.records.insert(key.clone(), record(node.clone(), tag, guard));
			changes.added.push((key, node));
		}

		for node in prepend.iter().rev() {
			dom.prepend_child(&targets.body, node);
		}
		for guard in immediate {
			guard.fire();
		}

		let stale: Vec<TagKey> = self
			.records
			.iter()
			.filter(|(key, record)| !record.render_once && !desired.contains(*key))
			.map(|(key, _)| key.clone())
			.collect();
		for key in stale {
			let Some(record) = self.records.remove(&key) else {
				continue;
			};
			if let Some(guard) = &record.guard {
				guard.abandon();
			}
			if dom.is_connected(&record.node) {
				dom.remove_node(&record.node);
				changes.removed.push((key, record.node));
			}
		}

		for (key, server_tag) in server.by_key {
			if server_tag.once {
				tracing::debug!(tag = %key, "keeping render-once server-rendered tag");
				self.records.insert(
					key,
					TagRecord {
						node: server_tag.node,
						fingerprint: String::new(),
						placement: server_tag.placement,
						render_once: true,
						guard: None,
					},
				);
				continue;
			}
			tracing::debug!(tag = %key, "removing unmatched server-rendered tag");
			dom.remove_node(&server_tag.node);
			changes.removed.push((key, server_tag.node));
		}
		for (key, server_tag) in server.duplicates {
			if server_tag.once {
				continue;
			}
			tracing::debug!(tag = %key, "removing duplicate server-rendered tag");
			dom.remove_node(&server_tag.node);
			changes.removed.push((key, server_tag.node));
		}

		if !self.mounted {
			dom.remove_attribute(&targets.html, &self.options.ssr_attribute);
			self.mounted = true;
		}
		self.pending.retain(|guard| !guard.is_settled());

		tracing::debug!(
			added = changes.added.len(),
			removed = changes.removed.len(),
			"reconciled document metadata"
		);
		Ok(changes)
	}

	/// Runs every callback whose element never reported a load.
	///
	/// Returns how many callbacks ran.
	pub fn settle_callbacks(&mut self) -> usize {
		let fired = self.pending.iter().filter(|guard| guard.fire()).count();
		self.pending.clear();
		fired
	}

	fn collect_server_tags(&self, dom: &D, targets: &Targets<D::Node>) -> ServerTags<D::Node> {
		let marker = &self.options.attribute;
		let identifier = self.options.identifier_attribute();
		let mut occurrences: HashMap<(MetaField, String), usize> = HashMap::new();
		let mut server = ServerTags {
			by_key: BTreeMap::new(),
			duplicates: Vec::new(),
		};

		for (parent, in_head) in [(&targets.head, true), (&targets.body, false)] {
			for node in dom.children(parent) {
				let once = match dom.get_attribute(&node, marker) {
					Some(value) if value == self.options.ssr_app_id => false,
					Some(value) if value == ONCE_MARKER_VALUE => true,
					_ => continue,
				};
				let Some(field) = MetaField::from_tag_name(&dom.tag_name(&node)) else {
					continue;
				};

				let identity = match dom.get_attribute(&node, &identifier) {
					Some(vmid) => TagIdentity::Keyed(vmid),
					None => {
						let attributes: Vec<TagAttr> = dom
							.attributes(&node)
							.into_iter()
							.filter(|(name, _)| name != marker && name != LOADED_ATTRIBUTE)
							.map(|(name, value)| {
								if value.is_empty() && is_boolean_attribute(&name) {
									TagAttr::bare(name)
								} else {
									TagAttr::new(name, value)
								}
							})
							.collect();
						let content = dom.content(&node);
						let digest = structural_digest(
							field.tag_name(),
							&attributes,
							Some(content.as_str()).filter(|c| !c.is_empty()),
						);
						let rank = occurrences.entry((field, digest.clone())).or_insert(0);
						let occurrence = *rank;
						*rank += 1;
						TagIdentity::Structural { digest, occurrence }
					}
				};

				let prepended = Placement::BodyPrepend
					.data_attribute()
					.is_some_and(|name| dom.get_attribute(&node, name).is_some());
				let placement = if in_head {
					Placement::Head
				} else if prepended {
					Placement::BodyPrepend
				} else {
					Placement::BodyAppend
				};
				let key = TagKey::new(field, identity);
				let server_tag = ServerTag {
					node,
					placement,
					once,
				};
				if server.by_key.contains_key(&key) {
					server.duplicates.push((key, server_tag));
				} else {
					server.by_key.insert(key, server_tag);
				}
			}
		}
		server
	}
}

fn record<N>(node: N, tag: &TagDescriptor, guard: Option<CallbackGuard>) -> TagRecord<N> {
	TagRecord {
		node,
		fingerprint: tag.fingerprint(),
		placement: tag.placement,
		render_once: tag.render_once,
		guard,
	}
}

fn resolve_targets<D: MetaDom>(dom: &D) -> MetaResult<Targets<D::Node>> {
	let find = |target: DomTarget| {
		dom.target(target).ok_or_else(|| {
			tracing::warn!(target = %target, "document target missing");
			MetaError::MissingTarget(target.tag_name())
		})
	};
	Ok(Targets {
		html: find(DomTarget::Html)?,
		head: find(DomTarget::Head)?,
		body: find(DomTarget::Body)?,
	})
}

fn sync_title<D: MetaDom>(dom: &mut D, title: &TitleInstruction) {
	if !title.is_empty() && dom.title() != title.text {
		dom.set_title(&title.text);
	}
}

fn sync_attrs<D: MetaDom>(dom: &mut D, node: &D::Node, bag: &AttrsInstruction, marker: &str) {
	let previous = dom.get_attribute(node, marker);
	let wanted: BTreeSet<&str> = bag.attributes.iter().map(|attr| attr.name.as_str()).collect();

	for name in previous
		.as_deref()
		.unwrap_or("")
		.split(',')
		.filter(|name| !name.is_empty() && !wanted.contains(name))
	{
		dom.remove_attribute(node, name);
	}
	for attr in &bag.attributes {
		if dom.get_attribute(node, &attr.name).as_deref() != Some(attr.dom_value()) {
			dom.set_attribute(node, &attr.name, attr.dom_value());
		}
	}

	if bag.is_empty() {
		if previous.is_some() {
			dom.remove_attribute(node, marker);
		}
	} else {
		let managed = bag.managed_names();
		if previous.as_deref() != Some(managed.as_str()) {
			dom.set_attribute(node, marker, &managed);
		}
	}
}

fn create_element<D: MetaDom>(dom: &mut D, tag: &TagDescriptor, marker: &str) -> Option<D::Node> {
	let node = dom.create_element(tag.tag_name)?;
	dom.set_attribute(&node, marker, CLIENT_MARKER_VALUE);
	for attr in &tag.attributes {
		dom.set_attribute(&node, &attr.name, attr.dom_value());
	}
	if let Some(content) = &tag.content {
		dom.set_content(&node, &content.dom_text());
	}
	Some(node)
}

fn element_matches<D: MetaDom>(dom: &D, node: &D::Node, tag: &TagDescriptor, marker: &str) -> bool {
	let current: Vec<(String, String)> = dom
		.attributes(node)
		.into_iter()
		.filter(|(name, _)| name != marker && name != LOADED_ATTRIBUTE)
		.collect();
	let wanted: Vec<(String, String)> = tag
		.attributes
		.iter()
		.map(|attr| (attr.name.clone(), attr.dom_value().to_string()))
		.collect();
	let content = tag.content.as_ref().map(TagContent::dom_text).unwrap_or_default();
	current == wanted && dom.content(node) == content
}

fn update_element<D: MetaDom>(dom: &mut D, node: &D::Node, tag: &TagDescriptor, marker: &str) {
	let wanted: BTreeSet<&str> = tag.attributes.iter().map(|attr| attr.name.as_str()).collect();
	for (name, _) in dom.attributes(node) {
		if name != marker && name != LOADED_ATTRIBUTE && !wanted.contains(name.as_str()) {
			dom.remove_attribute(node, &name);
		}
	}
	for attr in &tag.attributes {
		if dom.get_attribute(node, &attr.name).as_deref() != Some(attr.dom_value()) {
			dom.set_attribute(node, &attr.name, attr.dom_value());
		}
	}
	let content = tag.content.as_ref().map(TagContent::dom_text).unwrap_or_default();
	if dom.content(node) != content {
		dom.set_content(node, &content);
	}
}

fn insert<D: MetaDom>(dom: &mut D, targets: &Targets<D::Node>, node: &D::Node, placement: Placement) {
	let parent = targets.parent(placement);
	match placement {
		Placement::BodyPrepend => dom.prepend_child(parent, node),
		Placement::Head | Placement::BodyAppend => dom.append_child(parent, node),
	}
}

fn loads_over_network(tag: &TagDescriptor) -> bool {
	match tag.field {
		MetaField::Script => tag.attribute("src").is_some(),
		MetaField::Link => tag.attribute("href").is_some(),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryDocument;
	use reinhardt_meta_core::prelude::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn options() -> MetaOptions {
		MetaOptions::default()
	}

	fn instructions(infos: &[RawMetaInfo], options: &MetaOptions) -> RenderInstructions {
		generate(&resolve(infos), options)
	}

	#[rstest]
	fn test_first_cycle_creates_tags(options: MetaOptions) {
		let mut doc = MemoryDocument::new();
		let mut reconciler = Reconciler::new(options.clone());
		let out = instructions(
			&[RawMetaInfo::new()
				.title("Home")
				.meta(RawTag::charset("utf-8"))
				.script(RawTag::script_src("/a.js").body())],
			&options,
		);

		let changes = reconciler.apply(&mut doc, &out).unwrap();

		assert_eq!(changes.added.len(), 2);
		assert!(changes.removed.is_empty());
		assert_eq!(doc.title(), "Home");
		assert_eq!(
			doc.inner_html(DomTarget::Head),
			r#"<meta data-rh-meta="true" charset="utf-8">"#
		);
		assert_eq!(
			doc.inner_html(DomTarget::Body),
			r#"<script data-rh-meta="true" src="/a.js" data-body="true"></script>"#
		);
	}

	#[rstest]
	fn test_second_identical_cycle_is_noop(options: MetaOptions) {
		let mut doc = MemoryDocument::new();
		let mut reconciler = Reconciler::new(options.clone());
		let out = instructions(
			&[RawMetaInfo::new()
				.meta(RawTag::meta_name("description", "x").vmid("d"))
				.link(RawTag::link("icon", "/i.png"))],
			&options,
		);

		reconciler.apply(&mut doc, &out).unwrap();
		let changes = reconciler.apply(&mut doc, &out).unwrap();
		assert!(changes.is_empty());
	}

	#[rstest]
	fn test_keyed_update_keeps_node(options: MetaOptions) {
		let mut doc = MemoryDocument::new();
		let mut reconciler = Reconciler::new(options.clone());
		let first = instructions(
			&[RawMetaInfo::new().meta(RawTag::meta_name("description", "one").vmid("d"))],
			&options,
		);
		reconciler.apply(&mut doc, &first).unwrap();
		let key = TagKey::new(MetaField::Meta, TagIdentity::Keyed("d".into()));
		let node = *reconciler.node(&key).unwrap();

		let second = instructions(
			&[RawMetaInfo::new().meta(RawTag::meta_property("og:description", "two").vmid("d"))],
			&options,
		);
		let changes = reconciler.apply(&mut doc, &second).unwrap();

		assert!(changes.is_empty());
		assert_eq!(*reconciler.node(&key).unwrap(), node);
		assert_eq!(doc.get_attribute(&node, "content").as_deref(), Some("two"));
		assert_eq!(doc.get_attribute(&node, "name"), None);
		assert_eq!(doc.get_attribute(&node, "property").as_deref(), Some("og:description"));
	}

	#[rstest]
	fn test_missing_target_leaves_state(options: MetaOptions) {
		let mut doc = MemoryDocument::with_targets(&[DomTarget::Html, DomTarget::Body]);
		let mut reconciler = Reconciler::new(options.clone());
		let out = instructions(&[RawMetaInfo::new().title("T")], &options);

		let err = reconciler.apply(&mut doc, &out).unwrap_err();
		assert_eq!(err, MetaError::MissingTarget("head"));
		assert!(!reconciler.is_mounted());
		assert_eq!(doc.title(), "");
	}

	#[rstest]
	fn test_attrs_bag_tracks_managed_names(options: MetaOptions) {
		let mut doc = MemoryDocument::new();
		let html = doc.target(DomTarget::Html).unwrap();
		doc.set_attribute(&html, "data-theme", "host");
		let mut reconciler = Reconciler::new(options.clone());

		let first = instructions(
			&[RawMetaInfo::new().html_attrs(AttrMap::new().with("lang", "en").with("dir", "ltr"))],
			&options,
		);
		reconciler.apply(&mut doc, &first).unwrap();
		assert_eq!(doc.get_attribute(&html, "data-rh-meta").as_deref(), Some("dir,lang"));

		let second = instructions(
			&[RawMetaInfo::new().html_attrs(AttrMap::new().with("lang", "fr"))],
			&options,
		);
		reconciler.apply(&mut doc, &second).unwrap();
		assert_eq!(doc.get_attribute(&html, "lang").as_deref(), Some("fr"));
		assert_eq!(doc.get_attribute(&html, "dir"), None);
		assert_eq!(doc.get_attribute(&html, "data-theme").as_deref(), Some("host"));

		reconciler.apply(&mut doc, &instructions(&[], &options)).unwrap();
		assert_eq!(doc.get_attribute(&html, "lang"), None);
		assert_eq!(doc.get_attribute(&html, "data-rh-meta"), None);
	}

	#[rstest]
	fn test_detached_record_recreated(options: MetaOptions) {
		let mut doc = MemoryDocument::new();
		let mut reconciler = Reconciler::new(options.clone());
		let out = instructions(&[RawMetaInfo::new().meta(RawTag::charset("utf-8"))], &options);
		reconciler.apply(&mut doc, &out).unwrap();

		let meta = doc.query("meta")[0];
		doc.remove_node(&meta);
		let changes = reconciler.apply(&mut doc, &out).unwrap();

		assert_eq!(changes.added.len(), 1);
		assert_eq!(doc.query("meta").len(), 1);
	}

	#[rstest]
	fn test_pbody_tags_keep_order(options: MetaOptions) {
		let mut doc = MemoryDocument::new();
		let body = doc.target(DomTarget::Body).unwrap();
		doc.append_element(body, "div", &[("id", "app")], "");
		let mut reconciler = Reconciler::new(options.clone());
		let out = instructions(
			&[RawMetaInfo::new()
				.script(RawTag::script_src("/1.js").pbody())
				.script(RawTag::script_src("/2.js").pbody())],
			&options,
		);
		reconciler.apply(&mut doc, &out).unwrap();

		let srcs: Vec<_> = doc
			.children(&body)
			.iter()
			.map(|node| doc.get_attribute(node, "src").unwrap_or_else(|| "app".to_string()))
			.collect();
		assert_eq!(srcs, vec!["/1.js", "/2.js", "app"]);
	}
}
