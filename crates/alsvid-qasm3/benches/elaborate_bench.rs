//! Benchmarks for the QASM3 front-end
//!
//! Run with: cargo bench -p alsvid-qasm3

use alsvid_qasm3::{elaborate, parse};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn ghz_source(n: u32) -> String {
    let mut source = format!("OPENQASM 3.0;\nqubit[{n}] q;\nh q[0];\n");
    for i in 1..n {
        source.push_str(&format!("cnot q[{}], q[{}];\n", i - 1, i));
    }
    source.push_str("#pragma braket result state_vector\n");
    source
}

fn unrolled_loop_source(iterations: u32) -> String {
    format!(
        "qubit[4] q;\nfor uint i in [0:{}] {{ h q; cnot q[0], q[1]; }}\n",
        iterations
    )
}

/// Benchmark parsing alone.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for n in &[4u32, 16, 64] {
        let source = ghz_source(*n);
        group.bench_with_input(BenchmarkId::new("ghz", n), &source, |b, src| {
            b.iter(|| parse(black_box(src)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the full parse + elaborate pipeline.
fn bench_elaborate(c: &mut Criterion) {
    let mut group = c.benchmark_group("elaborate");

    for n in &[4u32, 16, 64] {
        let source = ghz_source(*n);
        group.bench_with_input(BenchmarkId::new("ghz", n), &source, |b, src| {
            b.iter(|| elaborate(black_box(src)).unwrap());
        });
    }

    for iterations in &[8u32, 64, 256] {
        let source = unrolled_loop_source(*iterations);
        group.bench_with_input(
            BenchmarkId::new("loop_unroll", iterations),
            &source,
            |b, src| {
                b.iter(|| elaborate(black_box(src)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_elaborate);
criterion_main!(benches);
