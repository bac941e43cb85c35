//! Index build and lookup benchmarks over a generated tree.
//!
//! Run with: cargo bench --bench indexing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use trigrep::index::{build_index, IndexConfig, TrigramIndex};
use trigrep::query;

/// Create a test directory with sample files for benchmarking
fn create_benchmark_fixtures() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root_path = temp_dir.path().to_path_buf();

    for i in 0..200 {
        let content = format!(
            "// File {i}\n\
             fn function_{i}() {{\n    println!(\"Hello from function {i}\");\n}}\n\
             struct Struct{i} {{ field: i32, name: String }}\n"
        );
        fs::write(root_path.join(format!("file_{i}.rs")), content).expect("Failed to write file");
    }

    (temp_dir, root_path)
}

fn bench_build(c: &mut Criterion) {
    let (_dir, root) = create_benchmark_fixtures();
    let config = IndexConfig::default();

    let mut group = c.benchmark_group("indexing");
    group.sample_size(20);
    group.bench_function("build_200_files", |b| {
        b.iter(|| build_index(black_box(&root), &config).expect("Failed to build index"))
    });
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let docs: Vec<(String, String)> = (0..5_000)
        .map(|i| {
            (
                format!("doc_{i}.txt"),
                format!("record {i} alpha beta gamma {}", i % 97),
            )
        })
        .collect();
    let index = TrigramIndex::from_documents(docs);

    let mut group = c.benchmark_group("lookup");
    for pattern in ["alpha", "record 4.*gamma", "(beta|delta)", "gamma 9+"] {
        let q = query::compile(pattern).unwrap();
        group.bench_function(pattern, |b| b.iter(|| index.lookup(black_box(&q)).len()));
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_lookup);
criterion_main!(benches);
