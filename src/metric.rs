//! The generic "metric closure" abstraction (spec: a `(dist_fn, context)` pair,
//! expressed here as a trait plus a blanket impl over closures so a plain
//! `Fn(&T, &T) -> D` works without the caller writing any boilerplate).

/// An ordered, additive numeric type with a known maximum sentinel, suitable for use
/// as a metric's output (a distance).
///
/// Implemented for the common numeric types a distance function would realistically
/// return. `INFINITY` stands in for the "current best distance, initially +inf" value
/// queries start from (`f64::INFINITY` for float distances, `Self::MAX` otherwise).
pub trait Distance:
    Copy
    + PartialOrd
    + PartialEq
    + Send
    + Sync
    + 'static
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
{
    /// A sentinel at least as large as any distance this type will actually carry.
    const INFINITY: Self;

    /// The zero distance (identity: `d(x, x) == ZERO`).
    const ZERO: Self;
}

macro_rules! impl_distance_float {
    ($($t:ty),*) => {
        $(
            impl Distance for $t {
                const INFINITY: Self = <$t>::INFINITY;
                const ZERO: Self = 0.0;
            }
        )*
    };
}

macro_rules! impl_distance_int {
    ($($t:ty),*) => {
        $(
            impl Distance for $t {
                const INFINITY: Self = <$t>::MAX;
                const ZERO: Self = 0;
            }
        )*
    };
}

impl_distance_float!(f32, f64);
impl_distance_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// A metric over item type `T`: a function `d(a, b) -> Dist` satisfying the metric
/// axioms (non-negativity, identity of indiscernibles, symmetry, triangle inequality).
///
/// The engine never checks these axioms; a metric that violates them produces a tree
/// whose invariants (branch-node split correctness) may not hold, and whose query
/// results are then meaningless.
///
/// This is the Rust expression of the spec's "metric closure": a `(dist_fn, context)`
/// pair. An ordinary Rust closure already carries its own captured context, so the
/// blanket impl below lets a caller pass a plain closure directly.
pub trait Metric<T> {
    /// The distance type this metric produces.
    type Distance: Distance;

    /// Compute the distance between two items.
    fn distance(&self, a: &T, b: &T) -> Self::Distance;
}

impl<T, D, F> Metric<T> for F
where
    D: Distance,
    F: Fn(&T, &T) -> D,
{
    type Distance = D;

    fn distance(&self, a: &T, b: &T) -> D {
        self(a, b)
    }
}
