//! Decode/encode throughput on a handful of representative documents.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quickjson::{decode_str, encode, DecodeOptions, EncodeOptions};

fn sample_array(n: usize) -> String {
    let items: Vec<String> = (0..n)
        .map(|i| format!(r#"{{"id": {i}, "name": "item-{i}", "value": {}.5}}"#, i))
        .collect();
    format!("[{}]", items.join(","))
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for &n in &[10usize, 100, 1_000] {
        let text = sample_array(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &text, |b, text| {
            b.iter(|| decode_str(black_box(text), &DecodeOptions::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for &n in &[10usize, 100, 1_000] {
        let text = sample_array(n);
        let value = decode_str(&text, &DecodeOptions::default()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &value, |b, value| {
            b.iter(|| encode(black_box(value), &mut EncodeOptions::default()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
