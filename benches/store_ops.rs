//! Benchmarks for triple store lookups and inserts.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use world_graph::store::{DurableTripleStore, MemTripleStore, TripleStore};
use world_graph::triple::{Pair, Triple};

fn facts(n: usize) -> Vec<Triple> {
    (0..n)
        .map(|i| Triple::new(format!("E{i}"), format!("F{}", i % 97), format!("R{i}")))
        .collect()
}

fn fill(store: &dyn TripleStore, triples: &[Triple]) {
    for t in triples {
        store.insert(t).unwrap();
    }
}

fn bench_mem_find(c: &mut Criterion) {
    let store = MemTripleStore::with_capacity(10_000);
    fill(&store, &facts(10_000));
    let pair = Pair::new("F53", "E5000");

    c.bench_function("mem_find_10k", |bench| {
        bench.iter(|| black_box(store.find(&pair).unwrap()))
    });
}

fn bench_mem_insert(c: &mut Criterion) {
    let triples = facts(1_000);
    c.bench_function("mem_insert_1k", |bench| {
        bench.iter_batched(
            MemTripleStore::new,
            |store| fill(&store, &triples),
            BatchSize::SmallInput,
        )
    });
}

fn bench_mem_involving(c: &mut Criterion) {
    let store = MemTripleStore::new();
    fill(&store, &facts(10_000));

    c.bench_function("mem_involving_10k", |bench| {
        bench.iter(|| black_box(store.involving("F7", 5).unwrap()))
    });
}

fn bench_durable_find(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = DurableTripleStore::open(dir.path()).unwrap();
    fill(&store, &facts(1_000));
    let pair = Pair::new("E500", "F15");

    c.bench_function("durable_find_1k", |bench| {
        bench.iter(|| black_box(store.find(&pair).unwrap()))
    });
}

fn bench_durable_insert(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = DurableTripleStore::open(dir.path()).unwrap();
    let mut n = 0usize;

    c.bench_function("durable_insert", |bench| {
        bench.iter(|| {
            n += 1;
            store
                .insert(&Triple::new(format!("X{n}"), "Y", "Z"))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_mem_find,
    bench_mem_insert,
    bench_mem_involving,
    bench_durable_find,
    bench_durable_insert
);
criterion_main!(benches);
