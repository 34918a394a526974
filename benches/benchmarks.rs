use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::PathBuf;

use karozu::manifest::load_extension;
use karozu::props::PropertyValues;
use karozu::template::engine::build_context;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn sample_values() -> PropertyValues {
    PropertyValues::new()
        .with("dbType", "mysql")
        .with("provider", "planetscale")
}

fn bench_manifest_loading(c: &mut Criterion) {
    let extension_dir = fixture_path("drizzle");

    c.bench_function("load_extension", |b| {
        b.iter(|| {
            let loaded = load_extension(black_box(&extension_dir)).unwrap();
            black_box(loaded)
        });
    });
}

fn bench_context_building(c: &mut Criterion) {
    let values = sample_values();

    c.bench_function("build_context", |b| {
        b.iter(|| {
            let context = build_context(black_box(&values));
            black_box(context)
        });
    });
}

fn bench_compile(c: &mut Criterion) {
    let loaded = load_extension(&fixture_path("drizzle")).unwrap();
    let values = sample_values();

    c.bench_function("compile", |b| {
        b.iter(|| {
            let result = loaded.compile(black_box(&values)).unwrap();
            black_box(result)
        });
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let extension_dir = fixture_path("drizzle");

    c.bench_function("full_pipeline (load + compile + json)", |b| {
        b.iter(|| {
            let loaded = load_extension(black_box(&extension_dir)).unwrap();
            let result = loaded.compile(&sample_values()).unwrap();
            black_box(result.to_json().unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_manifest_loading,
    bench_context_building,
    bench_compile,
    bench_full_pipeline
);
criterion_main!(benches);
