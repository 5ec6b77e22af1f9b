use super::types::NodeRef;

/// Where a leaf's items physically live.
///
/// Every leaf starts `Arena`-backed (items are a contiguous range inside one list
/// arena slab, per the spec's data model). `add`'s growth path (the only way a
/// leaf's size can exceed the capacity it was built with) converts a leaf to
/// `Owned` the moment it overflows - see Design Notes, resolved Open Question on
/// insert semantics.
pub(crate) enum LeafStorage<T> {
    /// `(slab, offset, capacity)` - `capacity` contiguous slots starting at `offset`
    /// in list arena slab `slab`.
    Arena { slab: u32, offset: u32, capacity: u32 },

    /// Grown past arena capacity; now an independently-owned, reallocable buffer.
    Owned(Vec<T>),
}

/// A leaf: a terminal node holding a small, bounded array of items.
pub(crate) struct Leaf<T> {
    pub(crate) storage: LeafStorage<T>,
    pub(crate) size: u32,
}

impl<T> Leaf<T> {
    /// Borrow this leaf's items, wherever they currently live.
    pub(crate) fn items<'a>(&'a self, item_arena: &'a super::arena::ItemArena<T>) -> &'a [T] {
        match &self.storage {
            LeafStorage::Arena { slab, offset, .. } => item_arena.get(*slab, *offset, self.size),
            LeafStorage::Owned(v) => v.as_slice(),
        }
    }
}

/// A tagged node: either a branch (a pivot, its split radius, and two children) or a
/// leaf (a small bounded point list). Mirrors the spec's discriminated union.
pub(crate) enum Node<T, D> {
    Branch {
        pivot: T,
        radius: D,
        left: NodeRef,
        right: NodeRef,
    },
    Leaf(Leaf<T>),
}
