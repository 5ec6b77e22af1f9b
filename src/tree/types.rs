use smallvec::SmallVec;

use super::MAX_HEIGHT;

/// A reference to a node living inside a [`super::arena::NodeArena`]: a slab index
/// plus a slot index within that slab. Trivially `Copy`, alias-free - the idiomatic
/// alternative to the raw pointers the C source uses (see Design Notes, resolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeRef {
    pub(crate) slab: u32,
    pub(crate) slot: u32,
}

/// A (item, distance-to-current-pivot) pair, used during build and query.
pub(crate) struct Entry<T, D> {
    pub(crate) item: T,
    pub(crate) distance: D,
}

/// One unit of deferred work on the bulk-build stacks: "build the subtree rooted at
/// these entries, and link it as the left/right child of `parent`".
pub(crate) struct BuildFrame<T, D> {
    pub(crate) parent: NodeRef,
    pub(crate) entries: Vec<Entry<T, D>>,
}

/// A stack bounded by the tree's maximum height - the common case (a roughly
/// balanced tree) never allocates.
pub(crate) type HeightBoundedStack<X> = SmallVec<[X; MAX_HEIGHT]>;
