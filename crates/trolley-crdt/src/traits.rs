//! Traits shared by the delta-state types.

/// A join-semilattice whose mutators return deltas.
///
/// `join` must be commutative, associative and idempotent. Mutators on
/// implementing types return a delta of type `Self` that can be joined into
/// any replica, in any order, any number of times.
pub trait DeltaCrdt: Clone {
    /// Merge `other` (a full state or a delta) into `self`.
    fn join(&mut self, other: &Self);

    /// Owned variant of [`DeltaCrdt::join`].
    #[must_use]
    fn joined(mut self, other: &Self) -> Self {
        self.join(other);
        self
    }
}
