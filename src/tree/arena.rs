use super::node::Node;
use super::types::NodeRef;
use super::{VpError, LIST_SLAB, NODE_SLAB};

/// Slab-linked allocator for tree nodes. Append-only during build; a whole slab
/// chain is freed at once (`release_all`), never node-by-node - the engine has no
/// `remove`, only teardown/rebuild, so per-node reclaim is never needed.
pub(crate) struct NodeArena<T, D> {
    slabs: Vec<Vec<Node<T, D>>>,
}

impl<T, D> NodeArena<T, D> {
    pub(crate) fn new() -> Self {
        NodeArena { slabs: Vec::new() }
    }

    /// Append a node, growing the arena with a fresh slab if the current one is full.
    pub(crate) fn alloc(&mut self, node: Node<T, D>) -> Result<NodeRef, VpError> {
        let needs_new_slab = match self.slabs.last() {
            Some(slab) => slab.len() >= NODE_SLAB,
            None => true,
        };

        if needs_new_slab {
            self.slabs
                .try_reserve(1)
                .map_err(|_| VpError::OutOfMemory)?;
            let mut slab = Vec::new();
            slab.try_reserve_exact(NODE_SLAB)
                .map_err(|_| VpError::OutOfMemory)?;
            self.slabs.push(slab);
        }

        let slab_idx = (self.slabs.len() - 1) as u32;
        let slab = self.slabs.last_mut().expect("slab just ensured present");
        slab.push(node);
        Ok(NodeRef {
            slab: slab_idx,
            slot: (slab.len() - 1) as u32,
        })
    }

    pub(crate) fn get(&self, r: NodeRef) -> &Node<T, D> {
        &self.slabs[r.slab as usize][r.slot as usize]
    }

    pub(crate) fn get_mut(&mut self, r: NodeRef) -> &mut Node<T, D> {
        &mut self.slabs[r.slab as usize][r.slot as usize]
    }

    /// Free every slab in the chain at once.
    pub(crate) fn release_all(&mut self) {
        self.slabs.clear();
        self.slabs.shrink_to_fit();
    }

    /// Iterate every allocated node, in slab allocation order (used by
    /// teardown/collect, which cares only about visiting each node once).
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Node<T, D>> {
        self.slabs.iter().flat_map(|slab| slab.iter())
    }
}

impl<T, D> Default for NodeArena<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Slab-linked allocator for leaf item buffers. Leaf items are packed contiguously
/// within a single slab so a leaf scan (NN/KNN/range) is a plain slice iteration.
pub(crate) struct ItemArena<T> {
    slabs: Vec<Vec<T>>,
}

impl<T> ItemArena<T> {
    pub(crate) fn new() -> Self {
        ItemArena { slabs: Vec::new() }
    }

    /// Append `items` as one contiguous run, reserving `extra_capacity` additional
    /// headroom in the same slab for subsequent in-place growth (used by the
    /// degenerate-root leaf, which is built with room to grow up to `LIST_MAX`
    /// without graduating to an owned buffer - see `tree/node.rs`'s `LeafStorage`).
    ///
    /// `items.len() + extra_capacity` must not exceed `LIST_SLAB`.
    pub(crate) fn alloc_items(
        &mut self,
        items: Vec<T>,
        extra_capacity: usize,
    ) -> Result<(u32, u32), VpError> {
        let n = items.len();
        debug_assert!(n + extra_capacity <= LIST_SLAB);

        let needs_new_slab = match self.slabs.last() {
            Some(slab) => slab.len() + n > LIST_SLAB,
            None => true,
        };

        if needs_new_slab {
            self.slabs
                .try_reserve(1)
                .map_err(|_| VpError::OutOfMemory)?;
            let mut slab = Vec::new();
            slab.try_reserve_exact(LIST_SLAB.min(n + extra_capacity).max(n))
                .map_err(|_| VpError::OutOfMemory)?;
            self.slabs.push(slab);
        }

        let slab_idx = (self.slabs.len() - 1) as u32;
        let slab = self.slabs.last_mut().expect("slab just ensured present");
        let offset = slab.len() as u32;

        slab.try_reserve(n).map_err(|_| VpError::OutOfMemory)?;
        slab.extend(items);

        // Best-effort extra headroom for future in-place growth; failing this is not
        // fatal to the alloc itself, only to later growth, so don't propagate OOM here.
        let _ = slab.try_reserve(extra_capacity);

        Ok((slab_idx, offset))
    }

    pub(crate) fn get(&self, slab: u32, offset: u32, len: u32) -> &[T] {
        let slab = &self.slabs[slab as usize];
        &slab[offset as usize..(offset as usize + len as usize)]
    }

    /// Append `item` directly after an existing `(slab, offset, len)` range, *only*
    /// if that range is still the unallocated tail of its slab (true whenever it is
    /// the arena's only allocation so far, which is the only case this is called
    /// for: the single-leaf degenerate tree's root). Returns `false` - not an error
    /// - if the range is no longer the tail, so the caller can fall back to an
    /// owned buffer instead.
    pub(crate) fn try_grow_tail(
        &mut self,
        slab: u32,
        offset: u32,
        len: u32,
    ) -> Result<Option<&mut Vec<T>>, VpError> {
        if slab as usize != self.slabs.len().wrapping_sub(1) {
            return Ok(None);
        }
        let tail = self.slabs.last_mut().expect("checked non-empty above");
        if tail.len() != (offset + len) as usize || tail.len() >= LIST_SLAB {
            return Ok(None);
        }
        tail.try_reserve(1).map_err(|_| VpError::OutOfMemory)?;
        Ok(Some(tail))
    }

    /// Free every slab in the chain at once.
    pub(crate) fn release_all(&mut self) {
        self.slabs.clear();
        self.slabs.shrink_to_fit();
    }
}

impl<T> Default for ItemArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
