//! Dot kernel: a dotted map guarded by a causal context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::{CausalContext, Compaction};
use crate::dot::Dot;
use crate::traits::DeltaCrdt;

/// Values tagged with the dot of the event that wrote them.
///
/// The context knows every stored dot. It may also know dots that are no
/// longer stored: those were removed, and the context remembering them is
/// what stops a join from bringing them back.
///
/// Every mutator returns a delta kernel holding just the change.
///
/// # Example
///
/// ```rust
/// use trolley_crdt::{DeltaCrdt, DotKernel};
///
/// let mut alice: DotKernel<&str> = DotKernel::new();
/// let mut bob: DotKernel<&str> = DotKernel::new();
///
/// let add = alice.add("alice", "eggs");
/// bob.join(&add);
/// assert_eq!(bob.len(), 1);
///
/// let remove = bob.remove_value(&"eggs");
/// alice.join(&remove);
/// assert!(alice.is_empty());
///
/// // Replaying an old delta does not resurrect the removed entry.
/// alice.join(&add);
/// assert!(alice.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotKernel<V> {
    entries: BTreeMap<Dot, V>,
    context: CausalContext,
}

impl<V> Default for DotKernel<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            context: CausalContext::new(),
        }
    }
}

impl<V> DotKernel<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &CausalContext {
        &self.context
    }

    /// Stored `(dot, value)` pairs, in dot order.
    pub fn values(&self) -> impl Iterator<Item = (&Dot, &V)> {
        self.entries.iter()
    }

    pub fn get(&self, dot: &Dot) -> Option<&V> {
        self.entries.get(dot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `value` under a fresh dot of `replica_id`.
    pub fn add(&mut self, replica_id: &str, value: V) -> Self
    where
        V: Clone,
    {
        let dot = self.context.make_dot(replica_id);
        self.entries.insert(dot.clone(), value.clone());

        let mut delta = Self::new();
        delta.entries.insert(dot.clone(), value);
        delta.context.insert_dot(dot, Compaction::Now);
        delta
    }

    /// Removes the entry at `dot`. The delta is empty when `dot` is not stored.
    pub fn remove_dot(&mut self, dot: &Dot) -> Self {
        let mut delta = Self::new();
        if self.entries.remove(dot).is_some() {
            delta.context.insert_dot(dot.clone(), Compaction::Now);
        }
        delta
    }

    /// Removes every entry equal to `value`.
    pub fn remove_value(&mut self, value: &V) -> Self
    where
        V: PartialEq,
    {
        self.remove_where(|_, stored| stored == value)
    }

    /// Removes every entry.
    pub fn reset(&mut self) -> Self {
        self.remove_where(|_, _| true)
    }

    /// Removes every entry matching `predicate`; the delta's context knows
    /// all of them and stores none.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Self
    where
        F: FnMut(&Dot, &V) -> bool,
    {
        let mut delta = Self::new();
        self.entries.retain(|dot, value| {
            if predicate(dot, value) {
                delta.context.insert_dot(dot.clone(), Compaction::Deferred);
                false
            } else {
                true
            }
        });
        delta.context.compact();
        delta
    }

    fn all_entries_known(&self) -> bool {
        self.entries.keys().all(|dot| self.context.knows(dot))
    }
}

impl<V: Clone> DeltaCrdt for DotKernel<V> {
    fn join(&mut self, other: &Self) {
        // Entries other has seen but no longer holds were removed there.
        self.entries
            .retain(|dot, _| other.entries.contains_key(dot) || !other.context.knows(dot));

        // Adopt only dots this side has never seen. A dot known here but not
        // stored was removed here and must stay removed.
        for (dot, value) in &other.entries {
            if !self.context.knows(dot) {
                self.entries.insert(dot.clone(), value.clone());
            }
        }

        self.context.join(&other.context);
        debug_assert!(
            self.all_entries_known(),
            "dot kernel holds entries its context does not know"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values_of<V: Clone + Ord>(kernel: &DotKernel<V>) -> Vec<V> {
        let mut values: Vec<V> = kernel.values().map(|(_, v)| v.clone()).collect();
        values.sort();
        values
    }

    #[test]
    fn test_add_returns_single_dot_delta() {
        let mut kernel = DotKernel::new();
        let delta = kernel.add("r1", "milk".to_string());

        assert_eq!(delta.len(), 1);
        let (dot, value) = delta.values().next().unwrap();
        assert_eq!(dot, &Dot::new("r1", 1));
        assert_eq!(value, "milk");
        assert_eq!(delta.context().max_seq("r1"), 1);
        assert_eq!(kernel.get(&Dot::new("r1", 1)).map(String::as_str), Some("milk"));
    }

    #[test]
    fn test_remove_dot_present_and_absent() {
        let mut kernel = DotKernel::new();
        kernel.add("r1", 10);
        let delta = kernel.remove_dot(&Dot::new("r1", 1));
        assert!(delta.is_empty());
        assert!(delta.context().knows(&Dot::new("r1", 1)));
        assert!(kernel.is_empty());

        let noop = kernel.remove_dot(&Dot::new("r1", 7));
        assert!(noop.is_empty());
        assert!(noop.context().is_empty());
    }

    #[test]
    fn test_remove_value_removes_all_matching() {
        let mut kernel = DotKernel::new();
        kernel.add("r1", "a");
        kernel.add("r2", "b");
        kernel.add("r1", "a");
        let delta = kernel.remove_value(&"a");

        assert_eq!(values_of(&kernel), vec!["b"]);
        assert!(delta.is_empty());
        assert_eq!(delta.context().max_seq("r1"), 2);
        assert!(!delta.context().knows(&Dot::new("r2", 1)));
    }

    #[test]
    fn test_reset_forgets_values_keeps_history() {
        let mut kernel = DotKernel::new();
        kernel.add("r1", 1);
        kernel.add("r2", 2);
        let delta = kernel.reset();
        assert!(kernel.is_empty());
        assert!(kernel.context().knows(&Dot::new("r2", 1)));
        assert!(delta.context().knows(&Dot::new("r1", 1)));
        assert!(delta.context().knows(&Dot::new("r2", 1)));
    }

    #[test]
    fn test_join_removes_concurrently_removed() {
        let mut a = DotKernel::new();
        let add = a.add("a", "x");
        let mut b = DotKernel::new();
        b.join(&add);

        let remove = b.remove_value(&"x");
        a.join(&remove);
        assert!(a.is_empty());
    }

    #[test]
    fn test_concurrent_add_survives_remove() {
        let mut a = DotKernel::new();
        let mut b = DotKernel::new();
        let first = a.add("a", "x");
        b.join(&first);

        let remove = a.remove_value(&"x");
        let concurrent = b.add("b", "x");

        a.join(&concurrent);
        b.join(&remove);
        assert_eq!(a, b);
        assert_eq!(values_of(&a), vec!["x"]);
        assert_eq!(a.values().next().map(|(d, _)| d.clone()), Some(Dot::new("b", 1)));
    }

    #[test]
    fn test_replaying_add_after_remove_does_not_resurrect() {
        let mut kernel = DotKernel::new();
        let add = kernel.add("r1", "x");
        kernel.remove_value(&"x");
        kernel.join(&add);
        assert!(kernel.is_empty());
    }

    #[test]
    fn test_add_remove_round_trip_through_deltas() {
        let mut origin = DotKernel::new();
        let add = origin.add("r1", "x");
        let remove = origin.remove_value(&"x");
        assert!(origin.is_empty());

        let mut fresh = DotKernel::new();
        fresh.join(&add);
        fresh.join(&remove);
        assert!(fresh.is_empty());
        assert!(fresh.context().knows(&Dot::new("r1", 1)));
        assert_eq!(fresh, origin);

        let mut reversed = DotKernel::new();
        reversed.join(&remove);
        reversed.join(&add);
        assert_eq!(reversed, origin);
    }

    #[test]
    fn test_joined_is_owned_join() {
        let mut a = DotKernel::new();
        let delta = a.add("a", 5);
        let b = DotKernel::<i32>::new().joined(&delta);
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_json_keys_are_dot_strings() {
        let mut kernel = DotKernel::new();
        kernel.add("h:1", "x".to_string());
        let json = serde_json::to_value(&kernel).unwrap();
        assert_eq!(json["entries"]["h:1:1"], "x");
        let back: DotKernel<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back, kernel);
    }
}
