use crate::metric::Metric;

use super::arena::{ItemArena, NodeArena};
use super::node::{Leaf, LeafStorage, Node};
use super::sort::sort_entries;
use super::types::{BuildFrame, Entry, HeightBoundedStack, NodeRef};
use super::{VpError, LIST_BUILD_THRESHOLD, LIST_MAX};

/// Everything a completed build (or rebuild) hands back: the new root (`None` for
/// an empty tree) plus the two arenas backing it.
pub(crate) struct BuildOutput<T, D> {
    pub(crate) root: Option<NodeRef>,
    pub(crate) node_arena: NodeArena<T, D>,
    pub(crate) item_arena: ItemArena<T>,
}

/// Bulk-build a tree over `items` against `metric`.
///
/// Iterative: vantage selection and median-split partitioning are driven by two
/// explicit work stacks (`leftstack`, `rightstack`) rather than recursion, which
/// bounds native call-stack depth to O(1) regardless of tree height - only the
/// work stacks grow, and they're bounded by `MAX_HEIGHT`.
///
/// On `Err`, the caller must treat the tree as destroyed; no partial state escapes
/// this function (the arenas built so far are dropped with it).
pub(crate) fn build<T, M>(mut items: Vec<T>, metric: &M) -> Result<BuildOutput<T, M::Distance>, VpError>
where
    T: Send,
    M: Metric<T>,
{
    let mut node_arena = NodeArena::new();
    let mut item_arena = ItemArena::new();

    let n = items.len();
    if n == 0 {
        return Ok(BuildOutput {
            root: None,
            node_arena,
            item_arena,
        });
    }

    if n < LIST_MAX {
        let root = alloc_leaf(items, LIST_MAX, &mut item_arena, &mut node_arena)?;
        return Ok(BuildOutput {
            root: Some(root),
            node_arena,
            item_arena,
        });
    }

    let pivot = items.remove(0);
    let entries: Vec<Entry<T, M::Distance>> = items
        .into_iter()
        .map(|item| {
            let distance = metric.distance(&pivot, &item);
            Entry { item, distance }
        })
        .collect();

    let root = match split_frame(pivot, entries, &mut node_arena, &mut item_arena)? {
        SplitOutcome::Leaf(node_ref) => node_ref,
        SplitOutcome::Branch {
            node_ref,
            left,
            right,
        } => {
            let mut leftstack: HeightBoundedStack<BuildFrame<T, M::Distance>> = HeightBoundedStack::new();
            let mut rightstack: HeightBoundedStack<BuildFrame<T, M::Distance>> = HeightBoundedStack::new();
            leftstack.push(left);
            rightstack.push(right);

            run_build_loop(
                &mut leftstack,
                &mut rightstack,
                metric,
                &mut node_arena,
                &mut item_arena,
            )?;

            node_ref
        }
    };

    Ok(BuildOutput {
        root: Some(root),
        node_arena,
        item_arena,
    })
}

/// Drain both work stacks, always preferring `leftstack`, producing a depth-first
/// left-spine build order that bounds each stack's depth by `MAX_HEIGHT`.
fn run_build_loop<T, M>(
    leftstack: &mut HeightBoundedStack<BuildFrame<T, M::Distance>>,
    rightstack: &mut HeightBoundedStack<BuildFrame<T, M::Distance>>,
    metric: &M,
    node_arena: &mut NodeArena<T, M::Distance>,
    item_arena: &mut ItemArena<T>,
) -> Result<(), VpError>
where
    T: Send,
    M: Metric<T>,
{
    loop {
        let (frame, is_left) = match leftstack.pop() {
            Some(frame) => (frame, true),
            None => match rightstack.pop() {
                Some(frame) => (frame, false),
                None => break,
            },
        };

        let BuildFrame { parent, entries } = frame;

        let child_ref = if entries.len() < LIST_BUILD_THRESHOLD {
            let capacity = entries.len();
            let items: Vec<T> = entries.into_iter().map(|e| e.item).collect();
            alloc_leaf(items, capacity, item_arena, node_arena)?
        } else {
            let mut entries = entries;
            let pivot = entries.remove(0).item;
            for entry in entries.iter_mut() {
                entry.distance = metric.distance(&pivot, &entry.item);
            }

            match split_frame(pivot, entries, node_arena, item_arena)? {
                SplitOutcome::Leaf(node_ref) => node_ref,
                SplitOutcome::Branch {
                    node_ref,
                    left,
                    right,
                } => {
                    leftstack.push(left);
                    rightstack.push(right);
                    node_ref
                }
            }
        };

        attach_child(node_arena, parent, is_left, child_ref);
    }

    Ok(())
}

enum SplitOutcome<T, D> {
    Leaf(NodeRef),
    Branch {
        node_ref: NodeRef,
        left: BuildFrame<T, D>,
        right: BuildFrame<T, D>,
    },
}

/// Sort `entries` by (already-computed) distance to `pivot`, median-split them into
/// a branch's two children, and allocate the branch node. `entries` must already
/// carry each item's distance to `pivot`.
fn split_frame<T, D>(
    pivot: T,
    mut entries: Vec<Entry<T, D>>,
    node_arena: &mut NodeArena<T, D>,
    item_arena: &mut ItemArena<T>,
) -> Result<SplitOutcome<T, D>, VpError>
where
    T: Send,
    D: crate::metric::Distance,
{
    sort_entries(&mut entries);

    let m = entries.len();
    let right_len = m / 2;
    let mut right_start = m - right_len;

    // Walk the right boundary leftward across any tied run straddling it, so the
    // entire run lands on the right side and the right set stays strictly greater
    // than the left set's maximum distance.
    while right_start > 0
        && right_start < m
        && entries[right_start - 1].distance == entries[right_start].distance
    {
        right_start -= 1;
    }

    if right_start == 0 {
        // Every remaining entry ties the would-be split boundary (e.g. a cluster of
        // points equidistant from `pivot`). No radius value can separate a
        // non-empty left set from this group under the engine's strict
        // left-inclusive / right-exclusive split rule, so there's no valid branch
        // here: fold the pivot back in and emit one leaf instead.
        let mut items = Vec::with_capacity(m + 1);
        items.push(pivot);
        items.extend(entries.into_iter().map(|e| e.item));
        let capacity = items.len();
        let node_ref = alloc_leaf(items, capacity, item_arena, node_arena)?;
        return Ok(SplitOutcome::Leaf(node_ref));
    }

    let right_entries = entries.split_off(right_start);
    let radius = entries.last().expect("right_start > 0").distance;
    let left_entries = entries;

    // Children are built later (they're pushed as work frames); the branch is
    // allocated now so it has a stable NodeRef to serve as their parent, with
    // placeholder children patched in by `attach_child` once each is built.
    let node_ref = node_arena.alloc(Node::Branch {
        pivot,
        radius,
        left: NodeRef { slab: 0, slot: 0 },
        right: NodeRef { slab: 0, slot: 0 },
    })?;

    Ok(SplitOutcome::Branch {
        node_ref,
        left: BuildFrame {
            parent: node_ref,
            entries: left_entries,
        },
        right: BuildFrame {
            parent: node_ref,
            entries: right_entries,
        },
    })
}

fn attach_child<T, D>(node_arena: &mut NodeArena<T, D>, parent: NodeRef, is_left: bool, child: NodeRef) {
    match node_arena.get_mut(parent) {
        Node::Branch { left, right, .. } => {
            if is_left {
                *left = child;
            } else {
                *right = child;
            }
        }
        Node::Leaf(_) => unreachable!("a build frame's parent is always a branch"),
    }
}

fn alloc_leaf<T, D>(
    items: Vec<T>,
    capacity: usize,
    item_arena: &mut ItemArena<T>,
    node_arena: &mut NodeArena<T, D>,
) -> Result<NodeRef, VpError> {
    let size = items.len() as u32;
    let extra_capacity = capacity.saturating_sub(items.len());
    let (slab, offset) = item_arena.alloc_items(items, extra_capacity)?;
    node_arena.alloc(Node::Leaf(Leaf {
        storage: LeafStorage::Arena {
            slab,
            offset,
            capacity: capacity as u32,
        },
        size,
    }))
}
