/*!
Exact nearest-neighbor, k-NN, and range search over an arbitrary metric space via a
[vantage point tree](https://en.wikipedia.org/wiki/Vantage-point_tree).

* Safe: `#![forbid(unsafe_code)]`.
* Generic: works over any item type `T` and any [`Metric<T>`] that satisfies the metric
  axioms (non-negativity, identity, symmetry, triangle inequality).
* Arena-backed: nodes and leaf item buffers are packed into linked slabs so bulk build
  avoids one-allocation-per-node heap fragmentation.
* Iterative: build, query, teardown, and rebuild are all explicit-stack algorithms.
  No recursion, no stack-depth surprises.
* Fallible: `build`/`rebuild`/`add`/`add_rebuild`/`teardown` report
  out-of-memory via [`VpError`] instead of aborting.

### About

This crate answers three query classes over a dataset of items drawn from type `T`,
given a distance function `d: T x T -> Dist` supplied by the caller:

* **Nearest neighbor** ([`VpTree::nn`]) - the single closest item to a query point.
* **k-nearest neighbors** ([`VpTree::knn`]) - the `k` closest items, ascending by distance.
* **Range query** ([`VpTree::range`]) - every item within a given radius of a query point.

### Usage

```rust
use vantage_tree::VpTree;

// Euclidean distance on 1-D points.
let metric = |a: &i64, b: &i64| ((a - b).abs()) as f64;

let points: Vec<i64> = vec![0, 10, 20, 30, 40, 50];
let tree = VpTree::build(points, metric).expect("build should not OOM");

let nearest = tree.nn(&23).unwrap();
assert_eq!(nearest.item, 20);

let knn = tree.knn(&23, 3).unwrap();
assert_eq!(knn.len(), 3);
assert_eq!(knn[0].item, 20);

let within = tree.range(&23, 8.0).unwrap();
assert_eq!(within.len(), 2);
```

### Design

Space complexity is `O(n)`. Time complexity for a roughly-balanced tree (the median
split build rule aims for this, though no ongoing rebalancing is performed on
`add`):

| Operation | Typical Case |
| --- | --- |
| `build` | `O(n log n)` distance evaluations |
| `nn` / `knn` / `range` | `O(log n)` to `O(n)` depending on pruning effectiveness |
| `add` | `O(log n)`, unbalanced |

Distance-evaluation cost is entirely caller-defined (the metric is an opaque
closure/trait value), so all complexity bounds above are stated in terms of
distance-function calls, not wall-clock time.

### Trusted Dependencies

This crate has one dependency: [`smallvec`](https://crates.io/crates/smallvec), used
for the small, depth-bounded stacks and buffers the tree engine pushes and pops during
build and query (bounded by the tree's maximum height), so the common case avoids a
heap allocation entirely.

### Additional Considerations

**General Goals**

This project is an exercise in exact, non-approximate similarity search over an
arbitrary (caller-defined) metric, without recursion and without silent OOM aborts.
It does not attempt approximate nearest-neighbor search, automatic rebalancing on
insert, or persistence - see each type's documentation for what is and isn't in scope.

**Algorithmic Complexity**

| Operation | Typical Case | Worst Case |
| --- | --- | --- |
| `build` | `O(n log n)` | `O(n^2)` (pathological, non-pre-shuffled input) |
| `nn` / `knn` / `range` | `O(log n)` | `O(n)` |
| `add` | `O(log n)` | `O(n)` (degenerate, unbalanced tree) |

### License and Contributing

Licensed under the [MIT license](https://github.com/tnballo/vantage-tree/blob/master/LICENSE).
Contributions are welcome!
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod metric;
mod tree;

pub use crate::metric::{Distance, Metric};
pub use crate::tree::{Iter, Neighbor, VpError, VpTree};
