//! Partition descriptors
//!
//! Describes how a matrix's rows are spread over the remote list. The
//! descriptor is produced upstream; the data bus only reads it.

use serde::{Deserialize, Serialize};

use crate::error::DataBusError;
use crate::keys::KeySet;

/// One shard's owned rows, paired by position with a remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub keys: KeySet,
}

impl Partition {
    pub fn new(keys: KeySet) -> Self {
        Self { keys }
    }
}

/// How a matrix's rows are distributed across remotes
///
/// A missing descriptor (`None` at the call site) means `Replicated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PartitionDescriptor {
    /// Every remote holds the full matrix; remote 0 answers
    Replicated,

    /// Only `remotes[index]` holds the matrix
    Exclusive { index: usize },

    /// Rows split by disjoint key sets, `partitions[i]` owned by `remotes[i]`
    Sharded { partitions: Vec<Partition> },
}

impl PartitionDescriptor {
    pub fn sharded(keys: impl IntoIterator<Item = KeySet>) -> Self {
        PartitionDescriptor::Sharded {
            partitions: keys.into_iter().map(Partition::new).collect(),
        }
    }

    /// Minimum length of the remote list this descriptor addresses
    pub fn remotes_required(&self) -> usize {
        match self {
            PartitionDescriptor::Replicated => 1,
            PartitionDescriptor::Exclusive { index } => index.saturating_add(1),
            PartitionDescriptor::Sharded { partitions } => partitions.len(),
        }
    }

    /// Check the descriptor against the remote list before anything is sent
    pub fn validate(&self, remote_count: usize) -> Result<(), DataBusError> {
        let required = self.remotes_required();
        if remote_count < required {
            return Err(DataBusError::InvalidTopology(format!(
                "{} descriptor needs {} remote(s), got {}",
                self.kind(),
                required,
                remote_count
            )));
        }
        Ok(())
    }

    /// Index of the remote owning `row`, if any
    pub fn owner_of(&self, row: u64) -> Option<usize> {
        match self {
            PartitionDescriptor::Replicated => Some(0),
            PartitionDescriptor::Exclusive { index } => Some(*index),
            PartitionDescriptor::Sharded { partitions } => partitions.iter().position(|p| p.keys.contains(row)),
        }
    }

    /// Rows of `rows` that no remote owns, or `None` when `rows` is unbounded
    pub fn unowned_keys(&self, rows: &KeySet) -> Option<KeySet> {
        let keys = rows.iter()?;
        Some(KeySet::list(keys.filter(|row| self.owner_of(*row).is_none())))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PartitionDescriptor::Replicated => "replicated",
            PartitionDescriptor::Exclusive { .. } => "exclusive",
            PartitionDescriptor::Sharded { .. } => "sharded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remotes_required() {
        assert_eq!(PartitionDescriptor::Replicated.remotes_required(), 1);
        assert_eq!(PartitionDescriptor::Exclusive { index: 2 }.remotes_required(), 3);
        let sharded = PartitionDescriptor::sharded([KeySet::range(0, 5), KeySet::range(5, 10)]);
        assert_eq!(sharded.remotes_required(), 2);
    }

    #[test]
    fn test_validate_rejects_short_remote_list() {
        let err = PartitionDescriptor::Exclusive { index: 3 }.validate(2).unwrap_err();
        assert!(matches!(err, DataBusError::InvalidTopology(_)));
        assert!(err.to_string().contains("exclusive descriptor needs 4 remote(s), got 2"));

        assert!(PartitionDescriptor::Replicated.validate(0).is_err());
        assert!(PartitionDescriptor::Replicated.validate(1).is_ok());
    }

    #[test]
    fn test_owner_of_sharded() {
        let sharded = PartitionDescriptor::sharded([KeySet::list([1, 2]), KeySet::list([3, 4])]);
        assert_eq!(sharded.owner_of(2), Some(0));
        assert_eq!(sharded.owner_of(4), Some(1));
        assert_eq!(sharded.owner_of(5), None);
    }

    #[test]
    fn test_unowned_keys() {
        let sharded = PartitionDescriptor::sharded([KeySet::list([1, 2]), KeySet::range(3, 5)]);
        assert_eq!(sharded.unowned_keys(&KeySet::list([2, 4, 5, 9])), Some(KeySet::list([5, 9])));
        assert_eq!(sharded.unowned_keys(&KeySet::range(1, 5)), Some(KeySet::empty()));
        assert_eq!(sharded.unowned_keys(&KeySet::All), None);
        assert_eq!(
            PartitionDescriptor::Replicated.unowned_keys(&KeySet::range(0, 10)),
            Some(KeySet::empty())
        );
    }

    #[test]
    fn test_yaml_descriptor() {
        let yaml = r#"
type: sharded
partitions:
  - keys:
      range: { start: 0, end: 5 }
  - keys:
      list: [5, 6, 7]
"#;
        let descriptor: PartitionDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            descriptor,
            PartitionDescriptor::sharded([KeySet::range(0, 5), KeySet::list([5, 6, 7])])
        );

        let exclusive: PartitionDescriptor = serde_yaml::from_str("type: exclusive\nindex: 1\n").unwrap();
        assert_eq!(exclusive, PartitionDescriptor::Exclusive { index: 1 });
    }
}
