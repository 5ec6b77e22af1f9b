mod types;
pub(crate) use types::{BuildFrame, Entry, NodeRef};

mod arena;

mod node;
pub(crate) use node::Node;

mod sort;

mod builder;

mod query;
pub use query::Neighbor;

mod iter;
pub use iter::Iter;

mod error;
pub use error::VpError;

#[allow(clippy::module_inception)]
mod tree;
pub use tree::VpTree;

/// Maximum leaf size produced by bulk build.
pub(crate) const LIST_BUILD_THRESHOLD: usize = 100;

/// Maximum leaf capacity; degenerate (small-tree) root leaf size.
pub(crate) const LIST_MAX: usize = 1000;

/// Maximum tree depth / traversal & build stack capacity.
pub(crate) const MAX_HEIGHT: usize = 100;

/// Node arena slab size, in nodes.
pub(crate) const NODE_SLAB: usize = 1000;

/// List (leaf item) arena slab size, in items.
pub(crate) const LIST_SLAB: usize = 1_000_000;

/// Cross-over point from shellsort to the parallel k-way merge sort.
pub(crate) const SORT_THRESHOLD: usize = 2000;

/// Parallel sort worker count (the calling thread also participates, as the last
/// worker, so `SORT_THREADS - 1` additional threads are spawned per sort call).
pub(crate) const SORT_THREADS: usize = 8;

#[cfg(test)]
mod test;
