//! Server serializer integration tests.
//!
//! Raw metadata goes in as JSON, the way hosts hand it over, and comes out
//! as markup through [`ServerInjector`].

use proptest::prelude::*;
use reinhardt_meta_core::collect_json_tree;
use reinhardt_meta_core::prelude::*;
use reinhardt_meta_ssr::{ServerInjector, TextOptions};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn options() -> MetaOptions {
	MetaOptions::new().attribute("data-vue-meta")
}

fn inject(raw: Value, options: &MetaOptions) -> ServerInjector {
	let info = RawMetaInfo::from_json(&raw, options).unwrap();
	ServerInjector::generate(&info, options).unwrap()
}

#[rstest]
fn test_single_charset(options: MetaOptions) {
	let injector = inject(json!({"meta": [{"charset": "utf-8"}]}), &options);

	assert_eq!(
		injector.meta().text(TextOptions::new()),
		r#"<meta data-vue-meta="ssr" charset="utf-8">"#
	);
	assert_eq!(injector.script().text(TextOptions::new()), "");
}

#[rstest]
#[case(json!({"meta": []}))]
#[case(json!({"meta": [{}]}))]
#[case(json!({}))]
fn test_empty_meta_renders_nothing(options: MetaOptions, #[case] raw: Value) {
	let injector = inject(raw, &options);
	for field in ["meta", "link", "style", "script", "noscript", "base", "title"] {
		assert_eq!(injector.field(field).unwrap().text(), "", "field {}", field);
	}
}

#[rstest]
fn test_null_title_renders_nothing(options: MetaOptions) {
	let injector = inject(json!({"title": null, "titleTemplate": "%s | Site"}), &options);
	assert_eq!(injector.title().text(), "");
}

#[rstest]
fn test_title_template(options: MetaOptions) {
	let injector = inject(json!({"title": "Home", "titleTemplate": "%s | Site"}), &options);
	assert_eq!(injector.title().text(), "<title>Home | Site</title>");
}

#[rstest]
fn test_ssr_attribute_only_on_html(options: MetaOptions) {
	let injector = inject(json!({"htmlAttrs": {}}), &options);
	assert_eq!(injector.html_attrs().text(true), "data-rh-meta-ssr");

	let injector = inject(json!({"headAttrs": {}}), &options);
	assert_eq!(injector.head_attrs().text(true), "");

	let injector = inject(json!({"bodyAttrs": {}}), &options);
	assert_eq!(injector.body_attrs().text(true), "");
}

#[rstest]
fn test_attrs_bag_keeps_declaration_order(options: MetaOptions) {
	let injector = inject(
		json!({"bodyAttrs": {"foo": "bar", "class": ["a", "b"], "hidden": false}}),
		&options,
	);
	assert_eq!(
		injector.body_attrs().text(false),
		r#"foo="bar" class="a b" data-vue-meta="class,foo""#
	);
}

#[rstest]
#[case(json!({"src": "/script.js", "pbody": true}), "", "", r#"<script data-vue-meta="ssr" src="/script.js" data-pbody="true"></script>"#)]
#[case(json!({"src": "/script.js", "body": true}), "", r#"<script data-vue-meta="ssr" src="/script.js" data-body="true"></script>"#, "")]
#[case(json!({"src": "/script.js"}), r#"<script data-vue-meta="ssr" src="/script.js"></script>"#, "", "")]
fn test_script_placement_queries(
	options: MetaOptions,
	#[case] tag: Value,
	#[case] head: &str,
	#[case] body: &str,
	#[case] pbody: &str,
) {
	let injector = inject(json!({"script": [tag]}), &options);
	let script = injector.script();

	assert_eq!(script.text(TextOptions::new()), head);
	assert_eq!(script.text(TextOptions::body()), body);
	assert_eq!(script.text(TextOptions::pbody()), pbody);
}

#[rstest]
fn test_identifier_and_content_tags(options: MetaOptions) {
	let injector = inject(
		json!({
			"meta": [{"vmid": "desc", "name": "description", "content": "Hello"}],
			"link": [{"rel": "stylesheet", "href": "/a.css"}],
			"style": [{"cssText": ".a{color:red}", "type": "text/css"}],
			"noscript": [{"innerHTML": "JavaScript required"}],
		}),
		&options,
	);

	assert_eq!(
		injector.meta().text(TextOptions::new()),
		r#"<meta data-vue-meta="ssr" data-vmid="desc" name="description" content="Hello">"#
	);
	assert_eq!(
		injector.link().text(TextOptions::new()),
		r#"<link data-vue-meta="ssr" rel="stylesheet" href="/a.css">"#
	);
	assert_eq!(
		injector.style().text(TextOptions::new()),
		r#"<style data-vue-meta="ssr" type="text/css">.a{color:red}</style>"#
	);
	assert_eq!(
		injector.noscript().text(TextOptions::new()),
		r#"<noscript data-vue-meta="ssr">JavaScript required</noscript>"#
	);
}

#[rstest]
fn test_json_script_cannot_close_element(options: MetaOptions) {
	let injector = inject(
		json!({"script": [{"type": "application/ld+json", "json": {"name": "</script><script>alert(1)"}}]}),
		&options,
	);
	assert_eq!(
		injector.script().text(TextOptions::new()),
		r#"<script data-vue-meta="ssr" type="application/ld+json">{"name":"<\/script><script>alert(1)"}</script>"#
	);
}

#[rstest]
fn test_attribute_values_escaped(options: MetaOptions) {
	let injector = inject(
		json!({"meta": [{"name": "description", "content": "\"quoted\" & <b>"}]}),
		&options,
	);
	assert_eq!(
		injector.meta().text(TextOptions::new()),
		r#"<meta data-vue-meta="ssr" name="description" content="&quot;quoted&quot; &amp; &lt;b&gt;">"#
	);
}

#[rstest]
fn test_sanitizer_disabled_by_tag_id(options: MetaOptions) {
	let injector = inject(
		json!({
			"script": [
				{"vmid": "raw", "innerHTML": "if (a < b) {}"},
				{"innerHTML": "if (c < d) {}"},
			],
			"__dangerouslyDisableSanitizersByTagID": {"raw": ["innerHTML"]},
		}),
		&options,
	);
	assert_eq!(
		injector.script().text(TextOptions::new()),
		"<script data-vue-meta=\"ssr\" data-vmid=\"raw\">if (a < b) {}</script>\
		 <script data-vue-meta=\"ssr\">if (c &lt; d) {}</script>"
	);
}

#[rstest]
fn test_component_tree_override(options: MetaOptions) {
	let infos = collect_json_tree(
		&json!({
			"metaInfo": {
				"title": "Root",
				"titleTemplate": "%s - App",
				"meta": [{"vmid": "desc", "name": "description", "content": "root"}],
			},
			"children": [
				{"metaInfo": {"title": "Child", "meta": [{"vmid": "desc", "name": "description", "content": "child"}]}},
				{"metaInfo": {"title": ""}},
			],
		}),
		&options,
	)
	.unwrap();
	let injector = ServerInjector::new(&infos, &options).unwrap();

	assert_eq!(injector.title().text(), "<title>Child - App</title>");
	assert_eq!(
		injector.meta().text(TextOptions::new()),
		r#"<meta data-vue-meta="ssr" data-vmid="desc" name="description" content="child">"#
	);
}

#[rstest]
fn test_custom_ssr_app_id() {
	let options = MetaOptions::new().ssr_app_id("shell");
	let injector = inject(json!({"link": [{"rel": "icon", "href": "/i.png"}]}), &options);
	assert_eq!(
		injector.link().text(TextOptions::new()),
		r#"<link data-rh-meta="shell" rel="icon" href="/i.png">"#
	);
}

fn arb_raw() -> impl Strategy<Value = Value> {
	(
		"[a-zA-Z <&>]{0,12}",
		prop::collection::vec(("[a-z]{1,5}", "[a-z&\"]{0,6}"), 0..4),
		prop::collection::vec(("/[a-z]{1,4}\\.js", any::<bool>(), any::<bool>()), 0..4),
	)
		.prop_map(|(title, meta, script)| {
			json!({
				"title": title,
				"htmlAttrs": {"lang": "en"},
				"meta": meta
					.into_iter()
					.map(|(name, content)| json!({"name": name, "content": content}))
					.collect::<Vec<_>>(),
				"script": script
					.into_iter()
					.map(|(src, body, pbody)| json!({"src": src, "body": body, "pbody": pbody}))
					.collect::<Vec<_>>(),
			})
		})
}

proptest! {
	/// Property: identical input serializes to identical bytes
	#[test]
	fn prop_serialization_deterministic(raw in arb_raw()) {
		let options = MetaOptions::default();
		let first = inject(raw.clone(), &options);
		let second = inject(raw, &options);

		prop_assert_eq!(first.head(true), second.head(true));
		prop_assert_eq!(first.body_prepend(true), second.body_prepend(true));
		prop_assert_eq!(first.body_append(true), second.body_append(true));
		prop_assert_eq!(first.html_attrs().text(true), second.html_attrs().text(true));
	}

	/// Property: each script shows up under exactly one placement query
	#[test]
	fn prop_each_script_in_one_placement(raw in arb_raw()) {
		let options = MetaOptions::default();
		let injector = inject(raw, &options);
		let script = injector.script();
		let total: usize = [TextOptions::new(), TextOptions::body(), TextOptions::pbody()]
			.into_iter()
			.map(|opts| script.text(opts).matches("<script ").count())
			.sum();

		prop_assert_eq!(total, script.len());
	}
}
