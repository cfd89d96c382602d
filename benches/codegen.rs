//! Code generator benchmarks

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use linkforge::utils::{generate_code, is_valid_code};

fn bench_generate_code(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_code");

    for length in [6, 10, 16] {
        group.bench_with_input(BenchmarkId::new("length", length), &length, |b, &length| {
            b.iter(|| generate_code(length));
        });
    }
    group.finish();
}

fn bench_is_valid_code(c: &mut Criterion) {
    let code = generate_code(10);

    c.bench_function("is_valid_code", |b| {
        b.iter(|| is_valid_code(&code));
    });
}

criterion_group!(benches, bench_generate_code, bench_is_valid_code);
criterion_main!(benches);
