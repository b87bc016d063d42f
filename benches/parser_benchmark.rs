//! Benchmarks for the block parser and the check pipeline.
//!
//! These benchmarks measure parsing and diagnosing `.bru` files of various
//! sizes; both must stay comfortably inside editor keystroke latency even
//! for unusually large files.

use bru_lang::cancel::CancelFlag;
use bru_lang::diagnostics::{run_checks, CheckContext};
use bru_lang::document::Document;
use bru_lang::{parser, FileKind};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

/// Generates a synthetic request file with the given number of header and
/// query-param entries.
fn generate_request_file(entries: usize) -> String {
    let mut content = String::new();
    content.push_str("meta {\n  name: Generated request\n  seq: 1\n}\n\n");
    content.push_str("post {\n  url: https://api.example.com/users/:id\n  body: json\n  auth: basic\n}\n\n");
    content.push_str("params:path {\n  id: 42\n}\n\n");

    content.push_str("headers {\n");
    for i in 0..entries {
        content.push_str(&format!("  X-Header-{}: value-{}\n", i, i));
    }
    content.push_str("}\n\n");

    content.push_str("auth:basic {\n  username: admin\n  password: {{password}}\n}\n\n");

    content.push_str("body:json {\n  {\n");
    for i in 0..entries {
        content.push_str(&format!("    \"field{}\": \"{{{{var{}}}}}\",\n", i, i));
    }
    content.push_str("    \"final\": true\n  }\n}\n\n");

    content.push_str("tests {\n");
    for i in 0..entries {
        content.push_str(&format!(
            "  test(\"check {}\", () => {{\n    expect(res.body.field{}).to.exist;\n  }});\n",
            i, i
        ));
    }
    content.push_str("}\n");

    content
}

/// Benchmark parsing a typical request file (~60 lines).
fn bench_parse_typical(c: &mut Criterion) {
    let content = generate_request_file(10);
    let document = Document::new(content);

    c.bench_function("parse_typical_request", |b| {
        b.iter(|| parser::parse(black_box(&document)))
    });
}

/// Benchmark parsing a large request file (~3,000 lines).
fn bench_parse_large(c: &mut Criterion) {
    let content = generate_request_file(1000);
    let document = Document::new(content);

    let mut group = c.benchmark_group("parse_large");
    group.throughput(Throughput::Bytes(document.text().len() as u64));
    group.bench_function("parse_large_request", |b| {
        b.iter(|| parser::parse(black_box(&document)))
    });
    group.finish();
}

/// Benchmark the full check pipeline over a typical request file.
fn bench_diagnostics(c: &mut Criterion) {
    let content = generate_request_file(10);
    let document = Document::new(content);
    let parsed = parser::parse(&document);
    let cancel = CancelFlag::new();

    c.bench_function("diagnostics_typical_request", |b| {
        b.iter(|| {
            let ctx = CheckContext::new(black_box(&document), black_box(&parsed), FileKind::Request);
            run_checks(&ctx, &cancel)
        })
    });
}

/// Benchmark document construction, the per-edit fixed cost.
fn bench_document_index(c: &mut Criterion) {
    let content = generate_request_file(1000);

    let mut group = c.benchmark_group("document_index");
    group.throughput(Throughput::Bytes(content.len() as u64));
    group.bench_function("document_index_large", |b| {
        b.iter(|| Document::new(black_box(content.as_str())))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_typical,
    bench_parse_large,
    bench_diagnostics,
    bench_document_index
);
criterion_main!(benches);
