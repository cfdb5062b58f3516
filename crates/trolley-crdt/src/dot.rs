//! Dots: per-replica, sequence-numbered event identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Separator between replica id and sequence in the key form.
pub const KEY_SEPARATOR: char = ':';

/// A unique causal event: the `sequence`-th event originated by `replica_id`.
///
/// Dots order by replica id first and sequence second, so all dots of one
/// replica sit next to each other in ascending order inside a `BTreeSet` or
/// `BTreeMap`.
///
/// The key form is `"<replica_id>:<sequence>"`. Replica ids may themselves
/// contain `:` (for example `host:port`); parsing splits on the last one.
///
/// # Example
///
/// ```rust
/// use trolley_crdt::Dot;
///
/// let dot: Dot = "10.0.0.1:5000:7".parse().unwrap();
/// assert_eq!(dot.replica_id(), "10.0.0.1:5000");
/// assert_eq!(dot.sequence(), 7);
/// assert_eq!(dot.to_string(), "10.0.0.1:5000:7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dot {
    replica_id: String,
    sequence: u64,
}

impl Dot {
    /// Creates a dot. Sequences start at 1.
    pub fn new(replica_id: impl Into<String>, sequence: u64) -> Self {
        debug_assert!(sequence >= 1, "dot sequences start at 1");
        Self {
            replica_id: replica_id.into(),
            sequence,
        }
    }

    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for Dot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.replica_id, KEY_SEPARATOR, self.sequence)
    }
}

/// Malformed dot key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DotParseError {
    #[error("dot key {0:?} has no ':' separator")]
    MissingSeparator(String),

    #[error("dot key {key:?} has a non-numeric sequence {sequence:?}")]
    InvalidSequence { key: String, sequence: String },

    #[error("dot key {0:?} has sequence 0")]
    ZeroSequence(String),
}

impl FromStr for Dot {
    type Err = DotParseError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let (replica_id, sequence) = key
            .rsplit_once(KEY_SEPARATOR)
            .ok_or_else(|| DotParseError::MissingSeparator(key.to_string()))?;
        let sequence: u64 = sequence
            .parse()
            .map_err(|_| DotParseError::InvalidSequence {
                key: key.to_string(),
                sequence: sequence.to_string(),
            })?;
        if sequence == 0 {
            return Err(DotParseError::ZeroSequence(key.to_string()));
        }
        Ok(Self {
            replica_id: replica_id.to_string(),
            sequence,
        })
    }
}

impl Serialize for Dot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(de::Error::custom)
    }
}
