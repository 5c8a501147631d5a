//! Row and column key sets
//!
//! A `KeySet` names the rows (or columns) a request is about. It is an immutable
//! value: every operation returns a new set.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a key set out of text
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeySetParseError {
    #[error("Invalid key '{0}': expected an unsigned integer")]
    InvalidKey(String),

    #[error("Invalid range '{0}': expected START..END with START <= END")]
    InvalidRange(String),
}

/// A set of row or column keys
///
/// Deserialized ranges go through `KeySet::range`, so an inverted range
/// arrives as the empty set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "RawKeySet")]
pub enum KeySet {
    /// Every key, unbounded
    All,

    /// Half-open range `[start, end)`
    Range { start: u64, end: u64 },

    /// Explicit keys
    List(BTreeSet<u64>),
}

/// Wire shape of `KeySet` before normalisation
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
enum RawKeySet {
    All,
    Range { start: u64, end: u64 },
    List(BTreeSet<u64>),
}

impl From<RawKeySet> for KeySet {
    fn from(raw: RawKeySet) -> Self {
        match raw {
            RawKeySet::All => KeySet::All,
            RawKeySet::Range { start, end } => KeySet::range(start, end),
            RawKeySet::List(keys) => KeySet::List(keys),
        }
    }
}

impl KeySet {
    /// The empty key set
    pub fn empty() -> Self {
        KeySet::List(BTreeSet::new())
    }

    /// Half-open range `[start, end)`; an inverted range is empty
    pub fn range(start: u64, end: u64) -> Self {
        if start >= end {
            return Self::empty();
        }
        KeySet::Range { start, end }
    }

    /// Explicit key list
    pub fn list(keys: impl IntoIterator<Item = u64>) -> Self {
        KeySet::List(keys.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            KeySet::All => false,
            KeySet::Range { start, end } => start >= end,
            KeySet::List(keys) => keys.is_empty(),
        }
    }

    /// Number of keys, or `None` for the unbounded set
    pub fn len(&self) -> Option<usize> {
        match self {
            KeySet::All => None,
            KeySet::Range { start, end } => Some(end.saturating_sub(*start) as usize),
            KeySet::List(keys) => Some(keys.len()),
        }
    }

    pub fn contains(&self, key: u64) -> bool {
        match self {
            KeySet::All => true,
            KeySet::Range { start, end } => (*start..*end).contains(&key),
            KeySet::List(keys) => keys.contains(&key),
        }
    }

    /// Iterate the keys in ascending order, or `None` for the unbounded set
    pub fn iter(&self) -> Option<Box<dyn Iterator<Item = u64> + '_>> {
        match self {
            KeySet::All => None,
            KeySet::Range { start, end } => Some(Box::new(*start..*end)),
            KeySet::List(keys) => Some(Box::new(keys.iter().copied())),
        }
    }

    /// Keys present in both sets
    pub fn intersect(&self, other: &KeySet) -> KeySet {
        match (self, other) {
            (KeySet::All, other) | (other, KeySet::All) => other.clone(),
            (KeySet::Range { start: a0, end: a1 }, KeySet::Range { start: b0, end: b1 }) => {
                KeySet::range(*a0.max(b0), *a1.min(b1))
            }
            (KeySet::Range { start, end }, KeySet::List(keys)) | (KeySet::List(keys), KeySet::Range { start, end }) => {
                if start >= end {
                    return KeySet::empty();
                }
                KeySet::List(keys.range(*start..*end).copied().collect())
            }
            (KeySet::List(a), KeySet::List(b)) => KeySet::List(a.intersection(b).copied().collect()),
        }
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySet::All => write!(f, "all"),
            KeySet::Range { start, end } => write!(f, "{}..{}", start, end),
            KeySet::List(keys) => {
                let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                write!(f, "{{{}}}", keys.join(","))
            }
        }
    }
}

/// Parses `all`, `START..END`, or a comma separated key list (`1,2,5`)
impl FromStr for KeySet {
    type Err = KeySetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('{').trim_end_matches('}').trim();
        if s.eq_ignore_ascii_case("all") || s == "*" {
            return Ok(KeySet::All);
        }

        if let Some((start, end)) = s.split_once("..") {
            let parse = |v: &str| {
                v.trim()
                    .parse::<u64>()
                    .map_err(|_| KeySetParseError::InvalidRange(s.to_string()))
            };
            let (start, end) = (parse(start)?, parse(end)?);
            if start > end {
                return Err(KeySetParseError::InvalidRange(s.to_string()));
            }
            return Ok(KeySet::range(start, end));
        }

        s.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| k.parse::<u64>().map_err(|_| KeySetParseError::InvalidKey(k.to_string())))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(KeySet::List)
    }
}
