//! Enable-wins flag.

use serde::{Deserialize, Serialize};

use crate::kernel::DotKernel;
use crate::traits::DeltaCrdt;

/// A boolean flag where a concurrent enable beats a disable.
///
/// `disable` only removes the enables it has observed, so an enable made
/// concurrently elsewhere keeps its dot and the flag stays on after merge.
///
/// ```rust
/// use trolley_crdt::{DeltaCrdt, EWFlag};
///
/// let mut a = EWFlag::new("a");
/// let mut b = EWFlag::new("b");
/// let on = a.enable();
/// b.join(&on);
///
/// let off = a.disable();
/// let on_again = b.enable();
/// a.join(&on_again);
/// b.join(&off);
/// assert!(a.read() && b.read());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EWFlag {
    replica_id: String,
    kernel: DotKernel<bool>,
}

impl EWFlag {
    pub fn new(replica_id: impl Into<String>) -> Self {
        Self {
            replica_id: replica_id.into(),
            kernel: DotKernel::new(),
        }
    }

    pub fn read(&self) -> bool {
        self.kernel.values().any(|(_, enabled)| *enabled)
    }

    pub fn enable(&mut self) -> Self {
        let own = self.replica_id.clone();
        let mut delta = self.kernel.remove_where(|dot, _| dot.replica_id() == own);
        delta.join(&self.kernel.add(&own, true));
        Self {
            replica_id: own,
            kernel: delta,
        }
    }

    pub fn disable(&mut self) -> Self {
        Self {
            replica_id: self.replica_id.clone(),
            kernel: self.kernel.reset(),
        }
    }
}

impl DeltaCrdt for EWFlag {
    fn join(&mut self, other: &Self) {
        self.kernel.join(&other.kernel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disabled() {
        assert!(!EWFlag::new("a").read());
    }

    #[test]
    fn test_enable_disable_locally() {
        let mut flag = EWFlag::new("a");
        flag.enable();
        assert!(flag.read());
        flag.enable();
        assert_eq!(flag.kernel.len(), 1);
        flag.disable();
        assert!(!flag.read());
    }

    #[test]
    fn test_observed_disable_wins_over_old_enable() {
        let mut a = EWFlag::new("a");
        let mut b = EWFlag::new("b");
        let on = a.enable();
        b.join(&on);
        let off = b.disable();
        a.join(&off);
        assert!(!a.read());

        // Late duplicate of the enable changes nothing.
        a.join(&on);
        assert!(!a.read());
    }

    #[test]
    fn test_concurrent_enable_wins() {
        let mut a = EWFlag::new("a");
        let mut b = EWFlag::new("b");
        b.join(&a.enable());

        let off = a.disable();
        let on = b.enable();
        a.join(&on);
        b.join(&off);
        assert!(a.read());
        assert!(b.read());
    }
}
