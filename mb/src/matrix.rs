//! Matrix abstraction and the keyed reference implementation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::keys::KeySet;

/// Tabular data addressed by row and column keys
///
/// The data bus only ever needs these four operations; storage layout and
/// arithmetic stay behind the trait.
pub trait Matrix: Clone + Send + Sync + 'static {
    /// Keys of the rows this matrix holds
    fn row_keys(&self) -> KeySet;

    fn row_count(&self) -> usize;

    /// Copy of the rows in `rows`, restricted to the columns in `cols`
    fn sub_matrix(&self, rows: &KeySet, cols: &KeySet) -> Self;

    /// Row-wise union of `others` into `self`
    ///
    /// Inputs are expected to hold disjoint rows; overlapping rows are not
    /// detected.
    fn merge_matrices(&mut self, others: Vec<Self>);
}

/// Sparse row-keyed matrix: `row -> (column -> value)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyedMatrix {
    rows: BTreeMap<u64, BTreeMap<u64, f64>>,
}

impl KeyedMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matrix from `(row, [(col, value)])` pairs
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = (u64, C)>,
        C: IntoIterator<Item = (u64, f64)>,
    {
        Self {
            rows: rows.into_iter().map(|(row, cols)| (row, cols.into_iter().collect())).collect(),
        }
    }

    pub fn get(&self, row: u64, col: u64) -> Option<f64> {
        self.rows.get(&row).and_then(|cols| cols.get(&col)).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = (u64, &BTreeMap<u64, f64>)> {
        self.rows.iter().map(|(k, v)| (*k, v))
    }

    /// Replace rows with those from `other`; returns the number of rows written
    pub fn upsert_rows(&mut self, other: KeyedMatrix) -> usize {
        let written = other.rows.len();
        self.rows.extend(other.rows);
        written
    }

    /// Copy in only the rows of `other` not already present; returns the number written
    pub fn insert_absent_rows(&mut self, other: KeyedMatrix) -> usize {
        let mut written = 0;
        for (row, cols) in other.rows {
            if let std::collections::btree_map::Entry::Vacant(slot) = self.rows.entry(row) {
                slot.insert(cols);
                written += 1;
            }
        }
        written
    }
}

impl Matrix for KeyedMatrix {
    fn row_keys(&self) -> KeySet {
        KeySet::list(self.rows.keys().copied())
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn sub_matrix(&self, rows: &KeySet, cols: &KeySet) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|(row, _)| rows.contains(**row))
            .map(|(row, values)| {
                let values = values
                    .iter()
                    .filter(|(col, _)| cols.contains(**col))
                    .map(|(col, value)| (*col, *value))
                    .collect();
                (*row, values)
            })
            .collect();
        Self { rows }
    }

    fn merge_matrices(&mut self, others: Vec<Self>) {
        for other in others {
            self.rows.extend(other.rows);
        }
    }
}
