use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::node::{LeafStorage, Node};
use super::{Neighbor, VpError, VpTree};

// Test helpers --------------------------------------------------------------------------------------------------

fn euclidean_1d(a: &f64, b: &f64) -> f64 {
    (a - b).abs()
}

fn euclidean_nd(a: &Vec<f64>, b: &Vec<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn brute_force_nn<'a>(items: &'a [f64], q: f64) -> (f64, f64) {
    let mut best = (items[0], euclidean_1d(&items[0], &q));
    for &x in &items[1..] {
        let d = euclidean_1d(&x, &q);
        if d < best.1 {
            best = (x, d);
        }
    }
    best
}

fn brute_force_knn(items: &[f64], q: f64, k: usize) -> Vec<(f64, f64)> {
    let mut all: Vec<(f64, f64)> = items.iter().map(|&x| (x, euclidean_1d(&x, &q))).collect();
    all.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    all.truncate(k);
    all
}

fn brute_force_range(items: &[f64], q: f64, r: f64) -> Vec<f64> {
    items
        .iter()
        .copied()
        .filter(|&x| euclidean_1d(&x, &q) <= r)
        .collect()
}

// Quantified invariants (spec §8, items 1-4) ---------------------------------------------------------------------

#[test]
fn build_empty_tree() {
    let tree = VpTree::build(Vec::<f64>::new(), euclidean_1d).unwrap();
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert!(tree.nn(&0.0).is_none());
    assert_eq!(tree.knn(&0.0, 3).unwrap().len(), 0);
    assert_eq!(tree.range(&0.0, 10.0).unwrap().len(), 0);
}

#[test]
fn build_single_item() {
    let tree = VpTree::build(vec![42.0], euclidean_1d).unwrap();
    assert_eq!(tree.len(), 1);
    let found = tree.nn(&0.0).unwrap();
    assert_eq!(found.item, 42.0);
    assert_eq!(found.distance, 42.0);
}

#[test]
fn build_preserves_count_and_multiset() {
    let items: Vec<f64> = (0..5000).map(|i| (i % 977) as f64).collect();
    let mut expected = items.clone();
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let tree = VpTree::build(items, euclidean_1d).unwrap();
    assert_eq!(tree.len(), 5000);

    let mut collected: Vec<f64> = tree.iter().copied().collect();
    collected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(collected, expected);
}

// Round-trip / idempotence (spec §8, items 5-6) ------------------------------------------------------------------

#[test]
fn teardown_returns_original_multiset() {
    let items: Vec<f64> = (0..3000).map(|i| (i * 7 % 1201) as f64).collect();
    let mut expected = items.clone();
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let tree = VpTree::build(items, euclidean_1d).unwrap();
    let mut returned = tree.teardown().unwrap();
    returned.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(returned, expected);
}

#[test]
fn rebuild_preserves_len_and_query_results() {
    let items: Vec<f64> = (0..2000).map(|i| (i * 13 % 811) as f64).collect();
    let mut tree = VpTree::build(items, euclidean_1d).unwrap();
    let size_before = tree.len();

    let queries: Vec<f64> = (0..50).map(|i| (i * 17) as f64).collect();
    let before: Vec<_> = queries.iter().map(|q| tree.nn(q)).collect();

    tree.rebuild().unwrap();
    assert_eq!(tree.len(), size_before);

    let after: Vec<_> = queries.iter().map(|q| tree.nn(q)).collect();
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.as_ref().map(|n| n.distance), a.as_ref().map(|n| n.distance));
    }
}

// Query correctness vs. brute force (spec §8, items 7-9) ---------------------------------------------------------

#[test]
fn nn_matches_brute_force() {
    let mut rng = SmallRng::seed_from_u64(1);
    let items: Vec<f64> = (0..1500).map(|_| rng.gen_range(-5000.0..5000.0)).collect();
    let tree = VpTree::build(items.clone(), euclidean_1d).unwrap();

    for _ in 0..50 {
        let q = rng.gen_range(-5000.0..5000.0);
        let expected = brute_force_nn(&items, q);
        let found = tree.nn(&q).unwrap();
        assert_eq!(found.distance, expected.1);
    }
}

#[test]
fn knn_matches_brute_force() {
    let mut rng = SmallRng::seed_from_u64(2);
    let items: Vec<f64> = (0..1500).map(|_| rng.gen_range(-5000.0..5000.0)).collect();
    let tree = VpTree::build(items.clone(), euclidean_1d).unwrap();

    for _ in 0..30 {
        let q = rng.gen_range(-5000.0..5000.0);
        let k = 7;
        let expected = brute_force_knn(&items, q, k);
        let found = tree.knn(&q, k).unwrap();

        assert_eq!(found.len(), k);
        let mut expected_dists: Vec<f64> = expected.iter().map(|(_, d)| *d).collect();
        let mut found_dists: Vec<f64> = found.iter().map(|n| n.distance).collect();
        expected_dists.sort_by(|a, b| a.partial_cmp(b).unwrap());
        found_dists.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(found_dists, expected_dists);

        for pair in found.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }
}

#[test]
fn range_matches_brute_force() {
    let mut rng = SmallRng::seed_from_u64(3);
    let items: Vec<f64> = (0..1200).map(|_| rng.gen_range(-1000.0..1000.0)).collect();
    let tree = VpTree::build(items.clone(), euclidean_1d).unwrap();

    for _ in 0..30 {
        let q = rng.gen_range(-1000.0..1000.0);
        let r = rng.gen_range(1.0..300.0);
        let expected = brute_force_range(&items, q, r);
        let found = tree.range(&q, r).unwrap();
        assert_eq!(found.len(), expected.len());
    }
}

// Boundary behaviours (spec §8, items 10-12) ---------------------------------------------------------------------

#[test]
fn knn_k_greater_than_len_returns_all() {
    let items = vec![1.0, 2.0, 3.0];
    let tree = VpTree::build(items, euclidean_1d).unwrap();
    let found = tree.knn(&0.0, 100).unwrap();
    assert_eq!(found.len(), 3);
}

#[test]
fn knn_rejects_zero_k() {
    let tree = VpTree::build(vec![1.0], euclidean_1d).unwrap();
    assert_eq!(
        tree.knn(&0.0, 0).unwrap_err(),
        VpError::InvalidArgument {
            reason: "k must be at least 1"
        }
    );
}

#[test]
fn range_rejects_negative_max_dist() {
    let tree = VpTree::build(vec![1.0], euclidean_1d).unwrap();
    assert_eq!(
        tree.range(&0.0, -1.0).unwrap_err(),
        VpError::InvalidArgument {
            reason: "max_dist must be non-negative"
        }
    );
}

// Concrete scenarios ----------------------------------------------------------------------------------------------

#[test]
fn scenario_s1_ordering() {
    let items = vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
    let tree = VpTree::build(items, euclidean_1d).unwrap();

    let nn = tree.nn(&23.0).unwrap();
    assert_eq!(nn.item, 20.0);
    assert_eq!(nn.distance, 3.0);

    let knn = tree.knn(&23.0, 3).unwrap();
    let pairs: Vec<(f64, f64)> = knn.iter().map(|n| (n.item, n.distance)).collect();
    assert_eq!(pairs, vec![(20.0, 3.0), (30.0, 7.0), (10.0, 13.0)]);

    let mut range = tree.range(&23.0, 8.0).unwrap();
    range.sort_by(|a, b| a.item.partial_cmp(&b.item).unwrap());
    let range_items: Vec<f64> = range.iter().map(|n| n.item).collect();
    assert_eq!(range_items, vec![20.0, 30.0]);
}

#[test]
fn scenario_s2_ties() {
    let items = vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
    let tree = VpTree::build(items, euclidean_1d).unwrap();

    let knn = tree.knn(&1.0, 4).unwrap();
    assert_eq!(knn.len(), 4);
    let mut dists: Vec<f64> = knn.iter().map(|n| n.distance).collect();
    dists.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(dists, vec![0.0, 0.0, 1.0, 1.0]);

    for pair in knn.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

// Point-wise insert and batch insert+rebuild ------------------------------------------------------------------------

#[test]
fn add_into_empty_tree() {
    let mut tree = VpTree::build(Vec::<f64>::new(), euclidean_1d).unwrap();
    tree.add(5.0).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.nn(&5.0).unwrap().item, 5.0);
}

#[test]
fn add_many_preserves_queryability() {
    let mut tree = VpTree::build(vec![0.0, 100.0], euclidean_1d).unwrap();
    for i in 0..50 {
        tree.add(i as f64).unwrap();
    }
    assert_eq!(tree.len(), 52);
    assert_eq!(tree.nn(&25.0).unwrap().distance, 0.0);
}

#[test]
fn add_rebuild_merges_and_rebalances() {
    let mut tree = VpTree::build(vec![1.0, 2.0, 3.0], euclidean_1d).unwrap();
    tree.add_rebuild(vec![10.0, 20.0, 30.0]).unwrap();
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.nn(&19.0).unwrap().item, 20.0);
}

// Degenerate all-tied-distance split (pivot equidistant from every remaining entry) ---------------------------------

#[test]
fn all_duplicate_points_build_and_query() {
    let items: Vec<f64> = std::iter::repeat(7.0).take(1200).collect();
    let tree = VpTree::build(items, euclidean_1d).unwrap();
    assert_eq!(tree.len(), 1200);
    let nn = tree.nn(&7.0).unwrap();
    assert_eq!(nn.distance, 0.0);
    let knn = tree.knn(&7.0, 10).unwrap();
    assert_eq!(knn.len(), 10);
    assert!(knn.iter().all(|n| n.distance == 0.0));
}

// Stress scenarios (spec §8, S3/S4/S5/S6) -----------------------------------------------------------------------

#[test]
#[ignore]
fn stress_s3_build_100k_points_nd() {
    let mut rng = SmallRng::seed_from_u64(42);
    let items: Vec<Vec<f64>> = (0..100_000)
        .map(|_| (0..32).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    let tree = VpTree::build(items, euclidean_nd).unwrap();
    assert_eq!(tree.len(), 100_000);
    assert_invariants_via_arena(&tree, euclidean_nd);
}

#[test]
#[ignore]
fn stress_s4_rebuild_identity_10k() {
    let mut rng = SmallRng::seed_from_u64(7);
    let items: Vec<f64> = (0..10_000).map(|_| rng.gen_range(-1e5..1e5)).collect();
    let mut tree = VpTree::build(items, euclidean_1d).unwrap();

    let queries: Vec<f64> = (0..100).map(|_| rng.gen_range(-1e5..1e5)).collect();
    let before: Vec<Neighbor<f64, f64>> = queries.iter().filter_map(|q| tree.nn(q)).collect();

    tree.rebuild().unwrap();

    let after: Vec<Neighbor<f64, f64>> = queries.iter().filter_map(|q| tree.nn(q)).collect();
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.distance, a.distance);
    }
}

#[test]
#[ignore]
fn stress_s5_range_vs_brute_force_5000() {
    let mut rng = SmallRng::seed_from_u64(11);
    let items: Vec<f64> = (0..5000).map(|_| rng.gen_range(-1e4..1e4)).collect();
    let tree = VpTree::build(items.clone(), euclidean_1d).unwrap();

    for _ in 0..50 {
        let q = rng.gen_range(-1e4..1e4);
        for _ in 0..5 {
            let r = rng.gen_range(1.0..2000.0);
            let expected = brute_force_range(&items, q, r).len();
            let found = tree.range(&q, r).unwrap().len();
            assert_eq!(found, expected);
        }
    }
}

#[test]
#[ignore]
fn stress_s6_teardown_10k() {
    let mut rng = SmallRng::seed_from_u64(99);
    let items: Vec<f64> = (0..10_000).map(|_| rng.gen_range(-1e5..1e5)).collect();
    let mut expected = items.clone();
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let tree = VpTree::build(items, euclidean_1d).unwrap();
    let mut returned = tree.teardown().unwrap();
    returned.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(returned, expected);
}

// Branch invariant cross-check (spec §8, items 2-3), walking node arena directly --------------------------------

#[test]
fn branch_invariants_hold_after_build() {
    let items: Vec<f64> = (0..2500).map(|i| ((i * 31) % 997) as f64).collect();
    let tree = VpTree::build(items, euclidean_1d).unwrap();
    assert_invariants_via_arena(&tree, euclidean_1d);
}

/// Walks the node arena directly (via `VpTree::internals`, a `#[cfg(test)]`-only
/// accessor) to validate §3's per-branch invariants: every item reachable via
/// `left` is within `radius` of `pivot`, every item reachable via `right` is
/// strictly farther. Generic over `T`/the metric itself so it covers both the
/// 1-D scenarios and the ℝ^32 stress build (S3).
fn assert_invariants_via_arena<T, M>(tree: &VpTree<T, M>, dist: impl Fn(&T, &T) -> M::Distance)
where
    T: Clone + Send,
    M: crate::metric::Metric<T>,
{
    let (root, node_arena, item_arena) = tree.internals();

    fn walk<T, D: crate::metric::Distance>(
        node_arena: &super::arena::NodeArena<T, D>,
        item_arena: &super::arena::ItemArena<T>,
        node_ref: super::types::NodeRef,
        dist: &impl Fn(&T, &T) -> D,
    ) {
        match node_arena.get(node_ref) {
            Node::Branch {
                pivot,
                radius,
                left,
                right,
            } => {
                check_subtree(node_arena, item_arena, *left, dist, pivot, |d| {
                    assert!(d <= *radius)
                });
                check_subtree(node_arena, item_arena, *right, dist, pivot, |d| {
                    assert!(d > *radius)
                });
                walk(node_arena, item_arena, *left, dist);
                walk(node_arena, item_arena, *right, dist);
            }
            Node::Leaf(_) => {}
        }
    }

    /// Check every item reachable from `node_ref` against `pivot` via `check`,
    /// where `check` receives `dist(pivot, item)`.
    fn check_subtree<T, D: crate::metric::Distance>(
        node_arena: &super::arena::NodeArena<T, D>,
        item_arena: &super::arena::ItemArena<T>,
        node_ref: super::types::NodeRef,
        dist: &impl Fn(&T, &T) -> D,
        pivot: &T,
        check: impl Fn(D) + Copy,
    ) {
        match node_arena.get(node_ref) {
            Node::Branch {
                pivot: child_pivot,
                left,
                right,
                ..
            } => {
                check(dist(pivot, child_pivot));
                check_subtree(node_arena, item_arena, *left, dist, pivot, check);
                check_subtree(node_arena, item_arena, *right, dist, pivot, check);
            }
            Node::Leaf(leaf) => {
                for item in leaf.items(item_arena) {
                    check(dist(pivot, item));
                }
            }
        }
    }

    if let Some(root) = root {
        walk(node_arena, item_arena, root, &dist);
    }
}

#[test]
fn leaf_storage_starts_arena_backed_then_graduates_on_overflow() {
    let mut tree = VpTree::build(vec![1.0, 2.0, 3.0], euclidean_1d).unwrap();
    let (root, node_arena, _) = tree.internals();
    match node_arena.get(root.unwrap()) {
        Node::Leaf(leaf) => assert!(matches!(leaf.storage, LeafStorage::Arena { .. })),
        Node::Branch { .. } => panic!("expected a single leaf root for n < LIST_MAX"),
    }

    for i in 0..(super::LIST_MAX as i64) {
        tree.add(i as f64).unwrap();
    }

    let (root, node_arena, _) = tree.internals();
    match node_arena.get(root.unwrap()) {
        Node::Leaf(leaf) => assert!(matches!(leaf.storage, LeafStorage::Owned(_))),
        Node::Branch { .. } => panic!("expected the degenerate root to remain a single leaf"),
    }
}
