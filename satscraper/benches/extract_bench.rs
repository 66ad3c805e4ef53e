//! Benchmarks for result table extraction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use satscraper::metadata::MetadataExtractor;
use satscraper::testing::{results_page, ResultRow};

fn extract_benchmark(c: &mut Criterion) {
    let rows: Vec<ResultRow> = (0..500)
        .map(|i| ResultRow::new(format!("b97262e5-704c-4bf7-ae26-{i:012x}")))
        .collect();
    let html = results_page(&rows);
    let extractor = MetadataExtractor::new();

    c.bench_function("extract_500_rows", |b| {
        b.iter(|| extractor.extract(black_box(&html)))
    });
}

criterion_group!(benches, extract_benchmark);
criterion_main!(benches);
