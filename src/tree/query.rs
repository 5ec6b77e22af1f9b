use crate::metric::{Distance, Metric};

use super::arena::{ItemArena, NodeArena};
use super::node::Node;
use super::types::{HeightBoundedStack, NodeRef};

/// One query result: an item together with its distance from the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<T, D> {
    /// The found item.
    pub item: T,
    /// Its distance from the query point.
    pub distance: D,
}

/// Decide which of a branch's children are worth descending into, given the
/// current acceptance radius `tau`, and push them onto the traversal stack. The
/// more promising child is pushed last so it's popped (and explored) first.
///
/// Each arm only ever subtracts the smaller side from the larger one (`radius -
/// delta` when `delta < radius`, `delta - radius` when `delta >= radius`), so the
/// subtraction result is always non-negative and this holds for unsigned/integer
/// distance types too - `tau` can be `D::INFINITY` (e.g. an integer type's `MAX`)
/// without any addition ever overflowing it.
fn push_children<D: Distance>(
    stack: &mut HeightBoundedStack<NodeRef>,
    delta: D,
    radius: D,
    tau: D,
    left: NodeRef,
    right: NodeRef,
) {
    if delta < radius {
        // Inside the pivot's ball: left always worth exploring.
        if tau >= radius - delta {
            stack.push(right);
        }
        stack.push(left);
    } else {
        // Outside (or exactly on) the pivot's ball: right always worth exploring.
        if delta - radius <= tau {
            stack.push(left);
        }
        stack.push(right);
    }
}

/// Nearest neighbor: single best candidate, tau starts at +infinity.
pub(crate) fn nn<T, M>(
    root: Option<NodeRef>,
    node_arena: &NodeArena<T, M::Distance>,
    item_arena: &ItemArena<T>,
    metric: &M,
    query: &T,
) -> Option<Neighbor<T, M::Distance>>
where
    T: Clone,
    M: Metric<T>,
{
    let root = root?;
    let mut best: Option<Neighbor<T, M::Distance>> = None;
    let mut stack: HeightBoundedStack<NodeRef> = HeightBoundedStack::new();
    stack.push(root);

    while let Some(node_ref) = stack.pop() {
        match node_arena.get(node_ref) {
            Node::Branch {
                pivot,
                radius,
                left,
                right,
            } => {
                let delta = metric.distance(pivot, query);
                consider(&mut best, pivot.clone(), delta);
                let tau = best.as_ref().map_or(M::Distance::INFINITY, |b| b.distance);
                push_children(&mut stack, delta, *radius, tau, *left, *right);
            }
            Node::Leaf(leaf) => {
                for item in leaf.items(item_arena) {
                    let delta = metric.distance(item, query);
                    consider(&mut best, item.clone(), delta);
                }
            }
        }
    }

    best
}

fn consider<T, D: PartialOrd>(best: &mut Option<Neighbor<T, D>>, item: T, distance: D) {
    let is_better = match best {
        None => true,
        Some(b) => distance < b.distance,
    };
    if is_better {
        *best = Some(Neighbor { item, distance });
    }
}

/// K-nearest-neighbors: a sorted-ascending result buffer capped at `k`, tau is
/// +infinity until the buffer fills then the current worst (`knn[k-1]`) distance.
pub(crate) fn knn<T, M>(
    root: Option<NodeRef>,
    node_arena: &NodeArena<T, M::Distance>,
    item_arena: &ItemArena<T>,
    metric: &M,
    query: &T,
    k: usize,
) -> Vec<Neighbor<T, M::Distance>>
where
    T: Clone,
    M: Metric<T>,
{
    let mut knn: Vec<Neighbor<T, M::Distance>> = Vec::with_capacity(k.min(64));

    let root = match root {
        Some(r) => r,
        None => return knn,
    };

    let mut stack: HeightBoundedStack<NodeRef> = HeightBoundedStack::new();
    stack.push(root);

    while let Some(node_ref) = stack.pop() {
        match node_arena.get(node_ref) {
            Node::Branch {
                pivot,
                radius,
                left,
                right,
            } => {
                let delta = metric.distance(pivot, query);
                knn_consider(&mut knn, k, pivot.clone(), delta);
                let tau = knn_tau(&knn, k);
                push_children(&mut stack, delta, *radius, tau, *left, *right);
            }
            Node::Leaf(leaf) => {
                for item in leaf.items(item_arena) {
                    let delta = metric.distance(item, query);
                    knn_consider(&mut knn, k, item.clone(), delta);
                }
            }
        }
    }

    knn
}

fn knn_tau<T, D: Distance>(knn: &[Neighbor<T, D>], k: usize) -> D {
    if knn.len() < k {
        D::INFINITY
    } else {
        knn[k - 1].distance
    }
}

/// Insert `(item, distance)` into the sorted `knn` buffer if it belongs there,
/// evicting the current worst entry first if the buffer is already at capacity `k`.
fn knn_consider<T, D: PartialOrd>(knn: &mut Vec<Neighbor<T, D>>, k: usize, item: T, distance: D) {
    if knn.len() >= k {
        if distance >= knn[knn.len() - 1].distance {
            return;
        }
        knn.pop();
    }

    let pos = knn.partition_point(|n| n.distance <= distance);
    knn.insert(pos, Neighbor { item, distance });
}

/// Range ("all-within") query: every item within `max_dist` of `query`. Tau is the
/// constant `max_dist` throughout.
pub(crate) fn range<T, M>(
    root: Option<NodeRef>,
    node_arena: &NodeArena<T, M::Distance>,
    item_arena: &ItemArena<T>,
    metric: &M,
    query: &T,
    max_dist: M::Distance,
) -> Vec<Neighbor<T, M::Distance>>
where
    T: Clone,
    M: Metric<T>,
{
    let mut result = Vec::new();

    let root = match root {
        Some(r) => r,
        None => return result,
    };

    let mut stack: HeightBoundedStack<NodeRef> = HeightBoundedStack::new();
    stack.push(root);

    while let Some(node_ref) = stack.pop() {
        match node_arena.get(node_ref) {
            Node::Branch {
                pivot,
                radius,
                left,
                right,
            } => {
                let delta = metric.distance(pivot, query);
                if delta <= max_dist {
                    result.push(Neighbor {
                        item: pivot.clone(),
                        distance: delta,
                    });
                }
                push_children(&mut stack, delta, *radius, max_dist, *left, *right);
            }
            Node::Leaf(leaf) => {
                for item in leaf.items(item_arena) {
                    let delta = metric.distance(item, query);
                    if delta <= max_dist {
                        result.push(Neighbor {
                            item: item.clone(),
                            distance: delta,
                        });
                    }
                }
            }
        }
    }

    result
}
