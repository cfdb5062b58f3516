//! Causal context: the set of dots a replica has observed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dot::Dot;

/// When [`CausalContext::insert_dot`] canonicalizes the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compaction {
    /// Compact right after recording the dot.
    Now,
    /// Only record the dot. The caller batches several inserts and calls
    /// [`CausalContext::compact`] before the context is compared, joined or
    /// serialized.
    Deferred,
}

/// Observed dots, stored as a contiguous high-water mark per replica plus a
/// set of exception dots beyond it.
///
/// A dot is known iff its sequence is at most the replica's high-water mark
/// or it sits in the exception set. In canonical (compacted) form no
/// exception is at or directly above its replica's mark, so two contexts
/// that know the same dots compare equal.
///
/// # Example
///
/// ```rust
/// use trolley_crdt::{CausalContext, Compaction, Dot};
///
/// let mut ctx = CausalContext::new();
/// ctx.insert_dot(Dot::new("a", 2), Compaction::Now);
/// assert_eq!(ctx.max_seq("a"), 0);          // 1 is missing, 2 is an exception
///
/// ctx.insert_dot(Dot::new("a", 1), Compaction::Now);
/// assert_eq!(ctx.max_seq("a"), 2);          // gap filled, folded into the mark
/// assert_eq!(ctx.exceptions().count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalContext {
    max_seq: BTreeMap<String, u64>,
    exceptions: BTreeSet<Dot>,
}

impl CausalContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contiguous high-water mark for `replica_id` (0 when nothing is known).
    pub fn max_seq(&self, replica_id: &str) -> u64 {
        self.max_seq.get(replica_id).copied().unwrap_or(0)
    }

    /// Known dots outside the contiguous prefix.
    pub fn exceptions(&self) -> impl Iterator<Item = &Dot> {
        self.exceptions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.max_seq.is_empty() && self.exceptions.is_empty()
    }

    /// Whether `dot` has been observed.
    pub fn knows(&self, dot: &Dot) -> bool {
        dot.sequence() <= self.max_seq(dot.replica_id()) || self.exceptions.contains(dot)
    }

    /// Allocates the next sequence for `replica_id` and records it as known.
    ///
    /// This is the only way new local events are created, so a context never
    /// hands out the same dot twice.
    pub fn make_dot(&mut self, replica_id: &str) -> Dot {
        // After compaction max + 1 is never an exception, so it is unused.
        self.compact();
        let dot = Dot::new(replica_id, self.max_seq(replica_id) + 1);
        self.insert_dot(dot.clone(), Compaction::Now);
        dot
    }

    /// Records `dot` as known.
    pub fn insert_dot(&mut self, dot: Dot, compaction: Compaction) {
        self.exceptions.insert(dot);
        if compaction == Compaction::Now {
            self.compact();
        }
    }

    /// Folds exceptions into the high-water marks until none is adjacent,
    /// and drops exceptions already covered by a mark. Idempotent.
    pub fn compact(&mut self) {
        // Exceptions iterate per replica in ascending sequence order, so a
        // single pass folds whole runs.
        let exceptions = std::mem::take(&mut self.exceptions);
        for dot in exceptions {
            let max = self.max_seq(dot.replica_id());
            if dot.sequence() == max + 1 {
                match self.max_seq.get_mut(dot.replica_id()) {
                    Some(mark) => *mark = dot.sequence(),
                    None => {
                        self.max_seq
                            .insert(dot.replica_id().to_string(), dot.sequence());
                    }
                }
            } else if dot.sequence() > max + 1 {
                self.exceptions.insert(dot);
            }
        }
    }

    /// Least upper bound: pointwise maximum of the marks, union of the
    /// exceptions, then compaction.
    pub fn join(&mut self, other: &Self) {
        for (replica_id, &seq) in &other.max_seq {
            let mark = self.max_seq.entry(replica_id.clone()).or_insert(0);
            *mark = (*mark).max(seq);
        }
        self.exceptions.extend(other.exceptions.iter().cloned());
        self.compact();
    }
}
