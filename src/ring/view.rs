//! Ring view snapshots and the key hashing contract.

use std::collections::{BTreeSet, HashMap};

use sha1::{Digest, Sha1};

/// First 8 bytes of the SHA-1 digest of `input`, big-endian.
///
/// Nodes hash with the exact same truncation; changing it would make client
/// and cluster disagree about key placement.
pub fn ring_hash(input: &str) -> u64 {
    let digest = Sha1::digest(input.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Ring position of `input` in a ring with `hash_space_size` positions.
pub fn hash_key(input: &str, hash_space_size: u64) -> u64 {
    ring_hash(input).checked_rem(hash_space_size).unwrap_or(0)
}

/// Namespaced storage key of a list id.
pub fn item_key(prefix: &str, item_id: &str) -> String {
    format!("{prefix}{item_id}")
}

/// Snapshot of ring ownership: token position to node id.
///
/// Views are immutable; a refresh builds a new one and replaces the old one
/// wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingView {
    /// Sorted ascending.
    tokens: Vec<u64>,
    token_to_node: HashMap<u64, String>,
    /// Distinct node ids, sorted.
    nodes: Vec<String>,
}

impl RingView {
    /// Build a view from a token map.
    pub fn from_token_map<I>(token_to_node: I) -> Self
    where
        I: IntoIterator<Item = (u64, String)>,
    {
        let token_to_node: HashMap<u64, String> = token_to_node.into_iter().collect();
        let mut tokens: Vec<u64> = token_to_node.keys().copied().collect();
        tokens.sort_unstable();
        let nodes: BTreeSet<&String> = token_to_node.values().collect();
        let nodes = nodes.into_iter().cloned().collect();
        Self {
            tokens,
            token_to_node,
            nodes,
        }
    }

    /// Placeholder view spacing `seeds` evenly over the ring.
    ///
    /// Seed `i` of `n` gets token `floor((i + 1) * hash_space_size / (n + 1))`.
    pub fn bootstrap(seeds: &[String], hash_space_size: u64) -> Self {
        let slots = seeds.len() as u128 + 1;
        Self::from_token_map(seeds.iter().enumerate().map(|(i, seed)| {
            let token = (i as u128 + 1) * u128::from(hash_space_size) / slots;
            (token as u64, seed.clone())
        }))
    }

    pub fn tokens(&self) -> &[u64] {
        &self.tokens
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn node_for_token(&self, token: u64) -> Option<&str> {
        self.token_to_node.get(&token).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `(token, node)` pairs in ring order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> + '_ {
        self.tokens
            .iter()
            .filter_map(|token| Some((*token, self.node_for_token(*token)?)))
    }

    /// Up to `n` distinct nodes responsible for `key`.
    ///
    /// Starts at the first token `>= key` (wrapping to the lowest token) and
    /// walks clockwise, skipping tokens of nodes already collected.
    pub fn preference_list_for_key(&self, key: u64, n: usize) -> Vec<&str> {
        let mut preference: Vec<&str> = Vec::with_capacity(n);
        if self.tokens.is_empty() || n == 0 {
            return preference;
        }

        let start = match self.tokens.partition_point(|token| *token < key) {
            index if index == self.tokens.len() => 0,
            index => index,
        };
        for step in 0..self.tokens.len() {
            let token = self.tokens[(start + step) % self.tokens.len()];
            let Some(node) = self.node_for_token(token) else {
                continue;
            };
            if !preference.contains(&node) {
                preference.push(node);
                if preference.len() == n {
                    break;
                }
            }
        }
        preference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(entries: &[(u64, &str)]) -> RingView {
        RingView::from_token_map(entries.iter().map(|(t, n)| (*t, n.to_string())))
    }

    #[test]
    fn test_ring_hash_known_answers() {
        // SHA-1("abc") = a9993e36 4706816a ...
        assert_eq!(ring_hash("abc"), 0xa999_3e36_4706_816a);
        assert_eq!(hash_key("abc", 65536), 0x816a);
        // SHA-1("") = da39a3ee 5e6b4b0d ...
        assert_eq!(hash_key("", 65536), 0x4b0d);
        assert_eq!(hash_key("abc", 0), 0);
    }

    #[test]
    fn test_item_key_namespacing() {
        assert_eq!(item_key("shoppinglist_", "42"), "shoppinglist_42");
    }

    #[test]
    fn test_preference_list_walks_clockwise() {
        let ring = view(&[(100, "A"), (5000, "B"), (40000, "C")]);
        assert_eq!(ring.preference_list_for_key(4000, 3), ["B", "C", "A"]);
        assert_eq!(ring.preference_list_for_key(5000, 3), ["B", "C", "A"]);
        assert_eq!(ring.preference_list_for_key(50, 2), ["A", "B"]);
    }

    #[test]
    fn test_preference_list_wraps_past_last_token() {
        let ring = view(&[(100, "A"), (5000, "B"), (40000, "C")]);
        assert_eq!(ring.preference_list_for_key(60000, 3), ["A", "B", "C"]);
    }

    #[test]
    fn test_preference_list_skips_duplicate_nodes() {
        let ring = view(&[(10, "A"), (20, "A"), (30, "B"), (40, "A"), (50, "C")]);
        assert_eq!(ring.preference_list_for_key(15, 3), ["A", "B", "C"]);
        // Fewer distinct nodes than requested.
        let small = view(&[(10, "A"), (20, "A")]);
        assert_eq!(small.preference_list_for_key(0, 3), ["A"]);
    }

    #[test]
    fn test_empty_ring_has_no_preference() {
        assert!(RingView::default().preference_list_for_key(7, 3).is_empty());
        let ring = view(&[(1, "A")]);
        assert!(ring.preference_list_for_key(7, 0).is_empty());
    }

    #[test]
    fn test_bootstrap_spaces_seeds_evenly() {
        let seeds = vec!["h1:1".to_string(), "h2:2".to_string()];
        let ring = RingView::bootstrap(&seeds, 65536);
        assert_eq!(ring.tokens(), [21845, 43690]);
        assert_eq!(ring.node_for_token(21845), Some("h1:1"));
        assert_eq!(ring.node_for_token(43690), Some("h2:2"));
        assert!(ring.tokens().iter().all(|t| *t > 0 && *t < 65536));
        assert_eq!(ring.nodes(), ["h1:1", "h2:2"]);
    }

    #[test]
    fn test_nodes_are_distinct_and_sorted() {
        let ring = view(&[(9, "b:1"), (3, "a:1"), (7, "b:1")]);
        assert_eq!(ring.nodes(), ["a:1", "b:1"]);
        let pairs: Vec<_> = ring.iter().collect();
        assert_eq!(pairs, [(3, "a:1"), (7, "b:1"), (9, "b:1")]);
    }
}
