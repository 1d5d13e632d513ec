use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fingerprint::Fingerprint;
use index::{IndexBuilder, RawRecord, SimilarityConfig, SubstructureConfig};

fn synthetic_records(count: u64) -> Vec<RawRecord> {
    (0..count)
        .map(|id| {
            let base = (id % 97) as i64 * 5;
            let bits: Vec<i64> = (base..base + 24).chain([(id % 13) as i64 + 600]).collect();
            RawRecord::new(id, bits)
        })
        .collect()
}

fn bench_substructure(c: &mut Criterion) {
    let records = synthetic_records(10_000);
    c.bench_function("substructure_build_10k", |b| {
        b.iter(|| {
            IndexBuilder::new()
                .build_substructure(SubstructureConfig::default(), black_box(records.clone()))
                .unwrap()
        })
    });

    let index = IndexBuilder::new()
        .build_substructure(SubstructureConfig::default(), records)
        .unwrap();
    let query = Fingerprint::from_bits([100, 101, 102]);
    c.bench_function("substructure_search", |b| {
        b.iter(|| index.search(black_box(&query)))
    });
}

fn bench_similarity(c: &mut Criterion) {
    let records = synthetic_records(2_000);
    let cfg = SimilarityConfig::default();
    c.bench_function("similarity_build_2k", |b| {
        b.iter(|| {
            IndexBuilder::new()
                .build_similarity(cfg, black_box(records.clone()))
                .unwrap()
        })
    });

    let index = IndexBuilder::new().build_similarity(cfg, records).unwrap();
    let query = Fingerprint::from_bits((100..124).chain([601]));
    c.bench_function("similarity_search", |b| {
        b.iter(|| index.search(black_box(&query)))
    });
}

criterion_group!(benches, bench_substructure, bench_similarity);
criterion_main!(benches);
