//! Benchmark: Import Extraction
//!
//! Measures directive scanning, normalization and placeholder staging.
//! Run: cargo bench --bench import_extraction

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sassline::import::{extract_imports, normalize_specifier, replace_directives, scan_directives};
use sassline::resolve::SourceBuffer;

/// Stylesheet with `imports` directives interleaved with rules and comments
fn stylesheet(imports: usize) -> String {
    let mut source = String::from("/* generated */\n");
    for i in 0..imports {
        source.push_str(&format!("@import \"components/part_{}\";\n", i));
        source.push_str(&format!(
            ".rule-{} {{ color: #{:06x}; // inline note\n  content: \"@import 'no'\"; }}\n",
            i,
            i * 4099
        ));
    }
    source
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_imports");

    for imports in [0usize, 8, 64] {
        let source = stylesheet(imports);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(format!("{}_imports", imports), |b| {
            b.iter(|| black_box(extract_imports(black_box(&source))))
        });
    }

    // Large file without the keyword hits the fast path
    let plain = ".a { color: red; }\n".repeat(2000);
    group.throughput(Throughput::Bytes(plain.len() as u64));
    group.bench_function("no_keyword_40kb", |b| {
        b.iter(|| black_box(extract_imports(black_box(&plain))))
    });

    group.finish();
}

fn bench_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_placeholders");
    let source = stylesheet(32);

    group.bench_function("normalize_and_replace_32", |b| {
        b.iter(|| {
            let directives = scan_directives(black_box(&source));
            let keys: Vec<_> = directives
                .iter()
                .map(|d| normalize_specifier(&d.specifier, "styles/", "scss").key)
                .collect();
            let mut keys = keys.iter();
            let staged = replace_directives(&source, &directives, |_| {
                keys.next().map(SourceBuffer::placeholder).unwrap_or_default()
            });
            black_box(staged.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_extract, bench_stage);
criterion_main!(benches);
