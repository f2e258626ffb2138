//! Benchmarks for the ripkit codec and store filtering.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ripkit::{codec, store, Entity};

fn sample_mapping(pairs: usize) -> BTreeMap<String, String> {
    (0..pairs)
        .map(|i| (format!("key_{:03}", i), format!("value {}", i)))
        .collect()
}

fn sample_entities(count: usize) -> Vec<Entity> {
    (0..count)
        .map(|i| {
            let mut key_values = BTreeMap::new();
            key_values.insert("classname".to_string(), format!("func_wall_{}", i % 7));
            key_values.insert("targetname".to_string(), format!("wall_{}", i));
            key_values.insert("origin".to_string(), format!("{} {} 0", i * 16, i * 8));
            Entity { key_values }
        })
        .collect()
}

// -- Codec benchmarks --

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let small = sample_mapping(4);
    let large = sample_mapping(64);
    let small_text = codec::render(&small);
    let large_text = codec::render(&large);

    group.bench_function("render_small", |b| {
        b.iter(|| codec::render(black_box(&small)))
    });

    group.bench_function("render_large", |b| {
        b.iter(|| codec::render(black_box(&large)))
    });

    group.bench_function("parse_small", |b| {
        b.iter(|| codec::parse(black_box(&small_text)))
    });

    group.bench_function("parse_large", |b| {
        b.iter(|| codec::parse(black_box(&large_text)))
    });

    group.finish();
}

// -- Store benchmarks --

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");

    let entities = sample_entities(2048);

    group.bench_function("filter_miss", |b| {
        b.iter(|| store::filter(black_box(&entities), black_box("no_such_needle")))
    });

    group.bench_function("filter_hit", |b| {
        b.iter(|| store::filter(black_box(&entities), black_box("func_wall_3")))
    });

    group.bench_function("snapshot", |b| {
        b.iter(|| store::snapshot(black_box(&entities)))
    });

    group.finish();
}

criterion_group!(benches, bench_codec, bench_store);
criterion_main!(benches);
