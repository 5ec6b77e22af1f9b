/// Errors for this crate's fallible operations.
///
/// Every operation that can fail reports failure this way instead of panicking or
/// aborting - `build`, `rebuild`, `add`, `add_rebuild`, and `teardown` all return
/// `Result<_, VpError>`. Querying an empty tree is not an error (it's an empty
/// result: `None` for `nn`, zero items written for `knn`, an empty `Vec` for
/// `range`) - see each method's documentation.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum VpError {
    /// An allocation failed: a node/item arena slab, a sort scratch buffer, a grown
    /// leaf's overflow buffer, or a teardown result buffer.
    OutOfMemory,

    /// A caller-supplied argument the engine cannot act on (e.g. `k == 0` for `knn`,
    /// or a negative `max_dist` for `range`). Carries a short, static explanation.
    InvalidArgument {
        /// Why the argument was rejected.
        reason: &'static str,
    },
}

impl std::fmt::Display for VpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VpError::OutOfMemory => write!(f, "out of memory"),
            VpError::InvalidArgument { reason } => write!(f, "invalid argument: {}", reason),
        }
    }
}

impl std::error::Error for VpError {}
