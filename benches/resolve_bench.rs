//! Benchmark: resolve + generate + serialize over a deep component tree

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use reinhardt_meta::prelude::*;
use reinhardt_meta::ssr::ServerInjector;

// Benchmark fixture: a chain of components, each overriding the previous
// description and adding its own stylesheet
fn deep_tree(depth: usize) -> MetaTree {
	let mut node = MetaTree::with_meta(
		RawMetaInfo::new()
			.title(format!("Page {}", depth))
			.meta(RawTag::meta_name("description", format!("leaf {}", depth)).vmid("desc")),
	);
	for level in (0..depth).rev() {
		let meta = RawMetaInfo::new()
			.title_template("%s | Bench")
			.html_attrs(AttrMap::new().with("lang", "en"))
			.meta(RawTag::meta_name("description", format!("level {}", level)).vmid("desc"))
			.meta(RawTag::meta_property("og:type", "website"))
			.link(RawTag::link("stylesheet", format!("/level-{}.css", level)))
			.script(RawTag::script_src(format!("/level-{}.js", level)).body());
		node = MetaTree::with_meta(meta).child(node);
	}
	node
}

fn benchmark_resolve(c: &mut Criterion) {
	let infos = collect_meta_info(&deep_tree(64));

	c.bench_function("resolve_deep_tree", |b| {
		b.iter(|| black_box(resolve(black_box(&infos))));
	});
}

fn benchmark_generate(c: &mut Criterion) {
	let merged = resolve(&collect_meta_info(&deep_tree(64)));
	let options = MetaOptions::default();

	c.bench_function("generate_deep_tree", |b| {
		b.iter(|| black_box(generate(black_box(&merged), &options)));
	});
}

fn benchmark_serialize(c: &mut Criterion) {
	let infos = collect_meta_info(&deep_tree(64));
	let options = MetaOptions::default();

	c.bench_function("serialize_deep_tree", |b| {
		b.iter(|| {
			let Ok(injector) = ServerInjector::new(black_box(&infos), &options) else {
				return;
			};
			black_box(injector.head(true));
			black_box(injector.body_append(true));
		});
	});
}

criterion_group!(
	benches,
	benchmark_resolve,
	benchmark_generate,
	benchmark_serialize
);
criterion_main!(benches);
