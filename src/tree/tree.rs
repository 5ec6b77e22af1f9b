use crate::metric::Metric;

use super::arena::{ItemArena, NodeArena};
use super::builder::{self, BuildOutput};
use super::node::{Leaf, LeafStorage, Node};
use super::query;
use super::types::NodeRef;
use super::{Iter, Neighbor, VpError};

/// A vantage point tree: an exact nearest-neighbor / k-NN / range-query index over
/// an arbitrary metric space.
///
/// `T` is the item type (stored by value, so it must be `Clone`); `M` supplies the
/// distance function, either a hand-written [`Metric`] impl or a plain
/// `Fn(&T, &T) -> D` closure.
///
/// The tree is not thread-safe: a single instance must not be queried and mutated
/// concurrently from different threads. Serializing that (e.g. behind a
/// reader/writer lock) is the caller's responsibility.
pub struct VpTree<T, M: Metric<T>> {
    root: Option<NodeRef>,
    size: usize,
    node_arena: NodeArena<T, M::Distance>,
    item_arena: ItemArena<T>,
    metric: M,
}

impl<T, M> VpTree<T, M>
where
    T: Clone + Send,
    M: Metric<T>,
{
    // Construction ------------------------------------------------------------------------------

    /// Bulk-build a tree over `items` against `metric`.
    ///
    /// On `Err`, no tree is returned; nothing is retained.
    pub fn build(items: Vec<T>, metric: M) -> Result<Self, VpError> {
        let size = items.len();
        let BuildOutput {
            root,
            node_arena,
            item_arena,
        } = builder::build(items, &metric)?;

        Ok(VpTree {
            root,
            size,
            node_arena,
            item_arena,
            metric,
        })
    }

    // Introspection -------------------------------------------------------------------------------

    /// Number of items currently in the tree.
    pub fn len(&self) -> usize {
        self.size
    }

    /// `true` if the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Borrow the metric this tree was built with.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Borrowing, depth-first iterator over every item (pivots and leaf items
    /// alike), in no particular order.
    pub fn iter(&self) -> Iter<'_, T, M::Distance> {
        Iter::new(self.root, &self.node_arena, &self.item_arena)
    }

    /// White-box access to the root, node arena, and item arena for structural
    /// invariant checks in the test module (which lives in a sibling file and
    /// so can't otherwise see these private fields).
    #[cfg(test)]
    pub(crate) fn internals(&self) -> (Option<NodeRef>, &NodeArena<T, M::Distance>, &ItemArena<T>) {
        (self.root, &self.node_arena, &self.item_arena)
    }

    // Queries ---------------------------------------------------------------------------------

    /// The single item closest to `query`, or `None` if the tree is empty.
    pub fn nn(&self, query: &T) -> Option<Neighbor<T, M::Distance>> {
        query::nn(self.root, &self.node_arena, &self.item_arena, &self.metric, query)
    }

    /// The `k` items closest to `query`, ascending by distance. Returns fewer than
    /// `k` only if the tree itself holds fewer than `k` items.
    ///
    /// # Errors
    /// [`VpError::InvalidArgument`] if `k == 0`.
    pub fn knn(&self, query: &T, k: usize) -> Result<Vec<Neighbor<T, M::Distance>>, VpError> {
        if k == 0 {
            return Err(VpError::InvalidArgument {
                reason: "k must be at least 1",
            });
        }
        Ok(query::knn(
            self.root,
            &self.node_arena,
            &self.item_arena,
            &self.metric,
            query,
            k,
        ))
    }

    /// Every item within `max_dist` of `query`. Unordered.
    ///
    /// # Errors
    /// [`VpError::InvalidArgument`] if `max_dist` is negative.
    pub fn range(
        &self,
        query: &T,
        max_dist: M::Distance,
    ) -> Result<Vec<Neighbor<T, M::Distance>>, VpError> {
        if max_dist < <M::Distance as crate::metric::Distance>::ZERO {
            return Err(VpError::InvalidArgument {
                reason: "max_dist must be non-negative",
            });
        }
        Ok(query::range(
            self.root,
            &self.node_arena,
            &self.item_arena,
            &self.metric,
            query,
            max_dist,
        ))
    }

    // Structural mutation -----------------------------------------------------------------------

    /// Point-wise insert. Traverses from the root comparing `item` against each
    /// branch's `(pivot, radius)` and descending left (`≤`) or right (`>`), then
    /// appends to the terminal leaf (growing it if full). No rebalancing - a
    /// pathological sequence of inserts can unbalance the tree arbitrarily; use
    /// [`VpTree::add_rebuild`] or [`VpTree::rebuild`] to recover.
    pub fn add(&mut self, item: T) -> Result<(), VpError> {
        let target = match self.root {
            Some(root) => self.find_leaf(root, &item),
            None => {
                let node_ref = self.node_arena.alloc(Node::Leaf(Leaf {
                    storage: LeafStorage::Owned(vec![item]),
                    size: 1,
                }))?;
                self.root = Some(node_ref);
                self.size = 1;
                return Ok(());
            }
        };

        self.insert_into_leaf(target, item)?;
        self.size += 1;
        Ok(())
    }

    fn find_leaf(&self, root: NodeRef, item: &T) -> NodeRef {
        let mut current = root;
        loop {
            match self.node_arena.get(current) {
                Node::Branch {
                    pivot,
                    radius,
                    left,
                    right,
                } => {
                    let delta = self.metric.distance(pivot, item);
                    current = if delta <= *radius { *left } else { *right };
                }
                Node::Leaf(_) => return current,
            }
        }
    }

    /// Teardown followed immediately by build: collects every item, then bulk
    /// rebuilds from scratch. Preserves `len()` and the set of items; does not
    /// preserve any particular tree shape across the rebuild.
    pub fn rebuild(&mut self) -> Result<(), VpError> {
        let items = self.collect_items()?;
        self.rebuild_from(items)
    }

    /// Collects every current item, appends `items`, and rebuilds from the
    /// combined set.
    pub fn add_rebuild(&mut self, items: Vec<T>) -> Result<(), VpError> {
        let mut combined = self.collect_items()?;
        combined.extend(items);
        self.rebuild_from(combined)
    }

    fn rebuild_from(&mut self, items: Vec<T>) -> Result<(), VpError> {
        let size = items.len();
        let BuildOutput {
            root,
            node_arena,
            item_arena,
        } = builder::build(items, &self.metric)?;

        self.root = root;
        self.node_arena = node_arena;
        self.item_arena = item_arena;
        self.size = size;
        Ok(())
    }

    /// Releases both arenas and returns every item the tree held, as a freshly
    /// allocated buffer. The tree is consumed; there is nothing left to destroy
    /// afterward.
    ///
    /// # Errors
    /// [`VpError::OutOfMemory`] if the result buffer cannot be allocated - the
    /// tree's arenas are released regardless, matching `destroy`.
    pub fn teardown(mut self) -> Result<Vec<T>, VpError> {
        self.collect_items()
    }

    /// Releases both arenas, discarding every item. Equivalent to dropping the
    /// tree; provided under this name for parity with the operation it mirrors.
    pub fn destroy(self) {}

    /// Walks the node arena in allocation order, collecting every branch's pivot
    /// and every leaf's items, then releases both arenas (leaving `self` in the
    /// empty/destroyed state regardless of whether collection itself succeeds).
    fn collect_items(&mut self) -> Result<Vec<T>, VpError> {
        let mut node_arena = std::mem::replace(&mut self.node_arena, NodeArena::new());
        let mut item_arena = std::mem::replace(&mut self.item_arena, ItemArena::new());
        self.root = None;

        let mut items = Vec::new();
        let reserved = items.try_reserve_exact(self.size);

        if reserved.is_ok() {
            for node in node_arena.iter() {
                match node {
                    Node::Branch { pivot, .. } => items.push(pivot.clone()),
                    Node::Leaf(leaf) => items.extend(leaf.items(&item_arena).iter().cloned()),
                }
            }
        }

        node_arena.release_all();
        item_arena.release_all();

        reserved.map_err(|_| VpError::OutOfMemory)?;
        Ok(items)
    }

    fn insert_into_leaf(&mut self, node_ref: NodeRef, item: T) -> Result<(), VpError> {
        enum Plan {
            GrowArenaTail { slab: u32, offset: u32, size: u32 },
            GraduateToOwned,
            PushOwned,
        }

        let plan = match self.node_arena.get(node_ref) {
            Node::Leaf(leaf) => match &leaf.storage {
                LeafStorage::Arena {
                    slab,
                    offset,
                    capacity,
                } => {
                    if leaf.size < *capacity {
                        Plan::GrowArenaTail {
                            slab: *slab,
                            offset: *offset,
                            size: leaf.size,
                        }
                    } else {
                        Plan::GraduateToOwned
                    }
                }
                LeafStorage::Owned(_) => Plan::PushOwned,
            },
            Node::Branch { .. } => unreachable!("insert target is always a leaf"),
        };

        match plan {
            Plan::GrowArenaTail { slab, offset, size } => {
                match self.item_arena.try_grow_tail(slab, offset, size)? {
                    Some(tail) => {
                        tail.push(item);
                        if let Node::Leaf(leaf) = self.node_arena.get_mut(node_ref) {
                            leaf.size += 1;
                        }
                    }
                    None => self.graduate_leaf(node_ref, item)?,
                }
            }
            Plan::GraduateToOwned => self.graduate_leaf(node_ref, item)?,
            Plan::PushOwned => {
                if let Node::Leaf(leaf) = self.node_arena.get_mut(node_ref) {
                    if let LeafStorage::Owned(vec) = &mut leaf.storage {
                        if vec.len() == vec.capacity() {
                            grow_owned(vec)?;
                        }
                        vec.push(item);
                        leaf.size += 1;
                    }
                }
            }
        }

        Ok(())
    }

    /// Move a full arena-backed leaf's items into an independently-owned,
    /// reallocable buffer, growing it by a factor of ~1.2 to make room, then push
    /// the new item.
    fn graduate_leaf(&mut self, node_ref: NodeRef, item: T) -> Result<(), VpError> {
        let owned = match self.node_arena.get(node_ref) {
            Node::Leaf(leaf) => match &leaf.storage {
                LeafStorage::Arena { slab, offset, .. } => {
                    let mut vec = self.item_arena.get(*slab, *offset, leaf.size).to_vec();
                    grow_owned(&mut vec)?;
                    vec.push(item);
                    vec
                }
                LeafStorage::Owned(_) => {
                    unreachable!("graduate_leaf only called on arena-backed leaves")
                }
            },
            Node::Branch { .. } => unreachable!("insert target is always a leaf"),
        };

        let new_size = owned.len() as u32;
        if let Node::Leaf(leaf) = self.node_arena.get_mut(node_ref) {
            leaf.storage = LeafStorage::Owned(owned);
            leaf.size = new_size;
        }
        Ok(())
    }
}

/// Grow `vec`'s capacity by the same factor the original engine used for leaf
/// overflow: `new_capacity = 1.2 * old_capacity + 24`.
fn grow_owned<T>(vec: &mut Vec<T>) -> Result<(), VpError> {
    let current = vec.capacity();
    let target = ((current as f64) * 1.2 + 24.0) as usize;
    let additional = target.saturating_sub(current).max(1);
    vec.try_reserve_exact(additional).map_err(|_| VpError::OutOfMemory)
}
