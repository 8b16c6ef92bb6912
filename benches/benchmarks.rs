//! Performance benchmarks for idindex
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use idindex::index::build::build_index_at;
use idindex::index::reader::IdIndexReader;
use idindex::index::types::{HashAlgorithm, IndexConfig, OccurrenceMask};
use idindex::index::{CancellationToken, FileContent, FileIdMapper, IdHashMaskMap, OccurrenceCollector};
use idindex::scanner::SimpleWordsScanner;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn sample_source(i: usize) -> String {
    format!(
        r#"// File {i}
fn function_{i}() {{
    println!("Hello from function {i}");
    let x = {i} * 2;
    let y = x + 1;
}}

/// Documented struct number {i}
struct Struct{i} {{
    field: i32,
    name: String,
}}

impl Struct{i} {{
    fn new() -> Self {{
        Self {{ field: {i}, name: "test".to_string() }}
    }}
}}
"#,
        i = i
    )
}

/// Create a test directory with sample files and an index over it
fn create_benchmark_fixtures() -> (TempDir, TempDir) {
    let repo = TempDir::new().expect("Failed to create temp dir");
    let index = TempDir::new().expect("Failed to create temp dir");

    for i in 0..50 {
        fs::write(repo.path().join(format!("file_{}.rs", i)), sample_source(i)).expect("Failed to write file");
    }

    build_index_at(
        repo.path(),
        index.path(),
        &IndexConfig::default(),
        &CancellationToken::new(),
        true,
    )
    .expect("Failed to build index");

    (repo, index)
}

fn bench_update_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_mask");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut map = IdHashMaskMap::new();
                for i in 0..size as i32 {
                    map.update_mask(black_box(i.wrapping_mul(0x9E37_79B9u32 as i32)), OccurrenceMask::IN_CODE);
                }
                map
            })
        });
    }

    group.finish();
}

fn bench_collector(c: &mut Criterion) {
    let text: String = (0..200).map(sample_source).collect();
    let mut group = c.benchmark_group("collector");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for algorithm in [HashAlgorithm::Stronger, HashAlgorithm::Compact] {
        group.bench_with_input(BenchmarkId::from_parameter(algorithm), &algorithm, |b, &algorithm| {
            let scanner = SimpleWordsScanner::new();
            b.iter(|| {
                let mut collector = OccurrenceCollector::new(algorithm);
                for (start, end) in scanner.spans(&text, 0, text.len()) {
                    collector.add_occurrence(&text, start, end, OccurrenceMask::IN_CODE);
                }
                collector.into_result()
            })
        });
    }

    group.finish();
}

fn bench_scanner(c: &mut Criterion) {
    let text: String = (0..200).map(sample_source).collect();
    let mut group = c.benchmark_group("scanner");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("simple_words", |b| {
        let scanner = SimpleWordsScanner::new();
        b.iter(|| scanner.spans(black_box(&text), 0, text.len()).count())
    });

    group.bench_function("rust_file", |b| {
        let mapper = FileIdMapper::with_config(&IndexConfig::default());
        let content = FileContent::new(Path::new("bench.rs"), &text);
        b.iter(|| mapper.map_file(black_box(&content)))
    });

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let (_repo, index) = create_benchmark_fixtures();
    let reader = IdIndexReader::open(index.path(), HashAlgorithm::Stronger).expect("Failed to open index");

    c.bench_function("files_with_word", |b| {
        b.iter(|| reader.files_with_word(black_box("Struct7"), OccurrenceMask::ANY, true))
    });

    c.bench_function("index_open", |b| {
        b.iter(|| IdIndexReader::open(black_box(index.path()), HashAlgorithm::Stronger))
    });
}

criterion_group!(benches, bench_update_mask, bench_collector, bench_scanner, bench_lookup);

criterion_main!(benches);
