//! Benchmarks for preview rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use marknote::render::Renderer;
use marknote::session::SAMPLE_DOCUMENT;

fn large_document() -> String {
    (0..200)
        .map(|i| format!("## Section {i}\n\nSome *text* with `code` and a [link](https://example.com).\n\n- item\n- item\n\n"))
        .collect()
}

fn bench_render_sample(c: &mut Criterion) {
    let renderer = Renderer::new();
    c.bench_function("render_sample", |b| {
        b.iter(|| renderer.render(black_box(SAMPLE_DOCUMENT)));
    });
}

fn bench_render_large(c: &mut Criterion) {
    let renderer = Renderer::new();
    let md = large_document();
    c.bench_function("render_large", |b| {
        b.iter(|| renderer.render(black_box(&md)));
    });
}

criterion_group!(benches, bench_render_sample, bench_render_large);
criterion_main!(benches);
