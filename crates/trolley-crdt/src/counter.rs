//! Causal counter.

use serde::{Deserialize, Serialize};

use crate::kernel::DotKernel;
use crate::traits::DeltaCrdt;

/// A resettable counter built on a [`DotKernel`].
///
/// Each replica keeps at most one dot holding its running contribution.
/// Updating replaces that dot, so a reset on another replica removes exactly
/// the contributions it observed while concurrent updates survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CCounter {
    replica_id: String,
    kernel: DotKernel<i64>,
}

impl CCounter {
    pub fn new(replica_id: impl Into<String>) -> Self {
        Self {
            replica_id: replica_id.into(),
            kernel: DotKernel::new(),
        }
    }

    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    /// Replica-tagged view of the same state, used when a delta received
    /// from elsewhere should be edited locally.
    pub fn with_replica_id(mut self, replica_id: impl Into<String>) -> Self {
        self.replica_id = replica_id.into();
        self
    }

    /// Sum of every replica's contribution.
    pub fn read(&self) -> i64 {
        self.kernel
            .values()
            .fold(0i64, |total, (_, value)| total.saturating_add(*value))
    }

    /// Replicas with a live contribution.
    pub fn contributors(&self) -> impl Iterator<Item = &str> {
        self.kernel.values().map(|(dot, _)| dot.replica_id())
    }

    pub fn inc(&mut self, by: i64) -> Self {
        self.update(by)
    }

    pub fn dec(&mut self, by: i64) -> Self {
        self.update(by.saturating_neg())
    }

    /// Removes every contribution this replica has observed.
    pub fn reset(&mut self) -> Self {
        Self {
            replica_id: self.replica_id.clone(),
            kernel: self.kernel.reset(),
        }
    }

    fn update(&mut self, by: i64) -> Self {
        let own = self.replica_id.clone();
        let base = self
            .kernel
            .values()
            .filter(|(dot, _)| dot.replica_id() == own)
            .fold(0i64, |total, (_, value)| total.saturating_add(*value));

        let mut delta = self.kernel.remove_where(|dot, _| dot.replica_id() == own);
        delta.join(&self.kernel.add(&own, base.saturating_add(by)));
        Self {
            replica_id: own,
            kernel: delta,
        }
    }
}

impl DeltaCrdt for CCounter {
    fn join(&mut self, other: &Self) {
        self.kernel.join(&other.kernel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inc_dec_read() {
        let mut counter = CCounter::new("a");
        counter.inc(3);
        counter.inc(2);
        counter.dec(1);
        assert_eq!(counter.read(), 4);
        // Only one live dot per replica.
        assert_eq!(counter.kernel.len(), 1);
    }

    #[test]
    fn test_deltas_reproduce_state() {
        let mut a = CCounter::new("a");
        let mut b = CCounter::new("b");
        let d1 = a.inc(5);
        let d2 = a.dec(2);
        b.join(&d1);
        b.join(&d2);
        assert_eq!(b.read(), 3);

        // Out of order arrival converges too.
        let mut c = CCounter::new("c");
        c.join(&d2);
        c.join(&d1);
        assert_eq!(c.read(), 3);
    }

    #[test]
    fn test_concurrent_increments_add_up() {
        let mut a = CCounter::new("a");
        let mut b = CCounter::new("b");
        let da = a.inc(2);
        let db = b.inc(7);
        a.join(&db);
        b.join(&da);
        assert_eq!(a.read(), 9);
        assert_eq!(a, b.clone().with_replica_id("a"));
    }

    #[test]
    fn test_reset_vs_concurrent_inc() {
        let mut a = CCounter::new("a");
        let mut b = CCounter::new("b");
        let d = a.inc(4);
        b.join(&d);

        let reset = a.reset();
        let concurrent = b.inc(1);
        assert_eq!(a.read(), 0);

        a.join(&concurrent);
        b.join(&reset);
        assert_eq!(a.read(), 1);
        assert_eq!(b.read(), 1);
    }

    #[test]
    fn test_saturates_instead_of_overflowing() {
        let mut counter = CCounter::new("a");
        counter.inc(i64::MAX);
        counter.inc(1);
        assert_eq!(counter.read(), i64::MAX);
    }
}
