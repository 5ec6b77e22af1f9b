use criterion::{criterion_group, criterion_main, Criterion};
use vantage_tree::VpTree;

use test_data::{euclidean, RAND_100, RAND_10_000, RAND_1_000};

// NN / KNN / range latency at a few tree sizes, mirroring the teacher's
// `bench_set_rand.rs::bench_get` shape (pre-built fixture, timed lookups only).

fn bench_nn(c: &mut Criterion) {
    let tree_100 = VpTree::build(RAND_100.points.clone(), euclidean).unwrap();
    let tree_1_000 = VpTree::build(RAND_1_000.points.clone(), euclidean).unwrap();
    let tree_10_000 = VpTree::build(RAND_10_000.points.clone(), euclidean).unwrap();

    c.bench_function("vpt_nn_100_rand", |b| {
        b.iter(|| {
            for q in &RAND_100.queries {
                let _ = tree_100.nn(q);
            }
        })
    });

    c.bench_function("vpt_nn_1_000_rand", |b| {
        b.iter(|| {
            for q in &RAND_1_000.queries {
                let _ = tree_1_000.nn(q);
            }
        })
    });

    c.bench_function("vpt_nn_10_000_rand", |b| {
        b.iter(|| {
            for q in &RAND_10_000.queries {
                let _ = tree_10_000.nn(q);
            }
        })
    });
}

fn bench_knn(c: &mut Criterion) {
    let tree_1_000 = VpTree::build(RAND_1_000.points.clone(), euclidean).unwrap();
    let tree_10_000 = VpTree::build(RAND_10_000.points.clone(), euclidean).unwrap();

    c.bench_function("vpt_knn_10_1_000_rand", |b| {
        b.iter(|| {
            for q in &RAND_1_000.queries {
                let _ = tree_1_000.knn(q, 10);
            }
        })
    });

    c.bench_function("vpt_knn_10_10_000_rand", |b| {
        b.iter(|| {
            for q in &RAND_10_000.queries {
                let _ = tree_10_000.knn(q, 10);
            }
        })
    });
}

fn bench_range(c: &mut Criterion) {
    let tree_1_000 = VpTree::build(RAND_1_000.points.clone(), euclidean).unwrap();
    let tree_10_000 = VpTree::build(RAND_10_000.points.clone(), euclidean).unwrap();

    c.bench_function("vpt_range_1_000_rand", |b| {
        b.iter(|| {
            for q in &RAND_1_000.queries {
                let _ = tree_1_000.range(q, 500.0);
            }
        })
    });

    c.bench_function("vpt_range_10_000_rand", |b| {
        b.iter(|| {
            for q in &RAND_10_000.queries {
                let _ = tree_10_000.range(q, 500.0);
            }
        })
    });
}

criterion_group!(benches, bench_nn, bench_knn, bench_range);
criterion_main!(benches);
