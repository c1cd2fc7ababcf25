//! Benchmarks for level detection and pattern classification.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pivotscope::prelude::*;

/// Generate realistic random bars
fn generate_bars(n: usize) -> Vec<Bar> {
  let mut bars = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let o = price;
    let c = (price + change).max(10.0);
    let h = o.max(c) + volatility * 0.5;
    let l = o.min(c) - volatility * 0.5;
    let v = 1_000.0 + ((i * 31) % 200) as f64 * 10.0;

    bars.push(Bar::new(i as i64 * 60_000, o, h, l, c, v));
    price = c;
  }

  bars
}

fn bench_detect_levels(c: &mut Criterion) {
  let config = LevelConfig::default();
  let mut group = c.benchmark_group("detect_levels");

  for size in [1_000, 10_000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("period_20", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(detect_levels(black_box(&bars), &config));
      })
    });
  }

  group.finish();
}

fn bench_detect_patterns(c: &mut Criterion) {
  let mut group = c.benchmark_group("detect_patterns");

  for size in [1_000, 10_000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("standard", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(detect_patterns(black_box(&bars)));
      })
    });
  }

  group.finish();
}

fn bench_analyze_parallel(c: &mut Criterion) {
  let bars1 = generate_bars(1000);
  let bars2 = generate_bars(1000);
  let bars3 = generate_bars(1000);
  let bars4 = generate_bars(1000);

  let config = LevelConfig::default();
  let classifier = PatternClassifier::new(Catalog::extended());

  let instruments: Vec<(&str, &[Bar])> =
    vec![("SYM1", &bars1), ("SYM2", &bars2), ("SYM3", &bars3), ("SYM4", &bars4)];

  c.bench_function("analyze_parallel_4_instruments", |b| {
    b.iter(|| {
      let _ = black_box(analyze_parallel(black_box(instruments.clone()), &config, &classifier));
    })
  });
}

criterion_group!(benches, bench_detect_levels, bench_detect_patterns, bench_analyze_parallel);

criterion_main!(benches);
