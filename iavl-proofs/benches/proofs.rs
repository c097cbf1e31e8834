#[macro_use]
extern crate criterion;

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use iavl_proofs::{
    prove_absent, prove_exists, prove_range,
    test_utils::{int_key, make_int_tree, MemTree},
};

/// Even keys only, so every odd key is absent.
fn prepare_tree(count: u32) -> (MemTree, Vec<u32>) {
    let keys: Vec<u32> = (0..count).map(|i| i * 2).collect();
    let tree = make_int_tree(&keys);
    (tree, keys)
}

/// Deterministic walk over `len` positions that visits them out of order.
fn probes(len: usize) -> impl Iterator<Item = usize> {
    (0..).map(move |i: usize| i.wrapping_mul(7919) % len)
}

fn bench(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("exists proof");
        for size in [1_000u32, 10_000, 100_000] {
            group.bench_with_input(BenchmarkId::new("prove", size), &size, |b, &size| {
                let (mut tree, keys) = prepare_tree(size);
                let mut next = probes(keys.len());
                b.iter(|| {
                    let i = next.next().unwrap_or_default();
                    black_box(prove_exists(&mut tree, &int_key(keys[i])).expect("prove"))
                });
            });
        }
    }

    c.bench_function("exists verify", |b| {
        let (mut tree, keys) = prepare_tree(100_000);
        let root = tree.root_hash().expect("root");
        let proofs: Vec<_> = probes(keys.len())
            .take(1_000)
            .map(|i| {
                let key = int_key(keys[i]);
                let (value, proof) = prove_exists(&mut tree, &key).expect("prove");
                (key, value, proof)
            })
            .collect();
        let mut next = probes(proofs.len());
        b.iter(|| {
            let (key, value, proof) = &proofs[next.next().unwrap_or_default()];
            proof.verify(key, value, &root).expect("verify");
        });
    });

    c.bench_function("absent verify", |b| {
        let (mut tree, keys) = prepare_tree(100_000);
        let root = tree.root_hash().expect("root");
        let proofs: Vec<_> = probes(keys.len())
            .take(1_000)
            .map(|i| {
                let key = int_key(keys[i] + 1);
                let proof = prove_absent(&mut tree, &key).expect("prove");
                (key, proof)
            })
            .collect();
        let mut next = probes(proofs.len());
        b.iter(|| {
            let (key, proof) = &proofs[next.next().unwrap_or_default()];
            proof.verify(key, &root).expect("verify");
        });
    });

    {
        let mut group = c.benchmark_group("range proof");
        let (mut tree, _) = prepare_tree(100_000);
        let root = tree.root_hash().expect("root");
        for width in [10u32, 100, 1_000] {
            let (start, end) = (int_key(50_001), int_key(50_001 + 2 * width));
            let result = prove_range(&mut tree, &start, &end, None).expect("prove");
            group.bench_with_input(BenchmarkId::new("prove", width), &width, |b, _| {
                b.iter(|| black_box(prove_range(&mut tree, &start, &end, None).expect("prove")));
            });
            group.bench_with_input(BenchmarkId::new("verify", width), &width, |b, _| {
                b.iter(|| {
                    result
                        .proof
                        .verify(&start, &end, &result.keys, &result.values, &root)
                        .expect("verify")
                });
            });
        }
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench
);
criterion_main!(benches);
