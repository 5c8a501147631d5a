//! Data bus error types

use std::time::Duration;
use thiserror::Error;

use crate::remote::TransportError;

/// Fatal outcomes of a fetch or push
///
/// A push that every remote answered but at least one refused is not an error;
/// it comes back as `Ok(false)`.
#[derive(Debug, Error)]
pub enum DataBusError {
    #[error("Timed out after {timeout:?} waiting on {}", .remotes.join(", "))]
    RemoteTimeout { remotes: Vec<String>, timeout: Duration },

    #[error("Remote {remote} failed: {source}")]
    RemoteError {
        remote: String,
        #[source]
        source: TransportError,
    },

    #[error("No data returned for matrix '{matrix}'")]
    EmptyResultSet { matrix: String },

    #[error("Partitions of matrix '{matrix}' cover {dispatched} of {total} rows")]
    IncompletePartitionCoverage {
        matrix: String,
        dispatched: usize,
        total: usize,
    },

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
}

impl DataBusError {
    /// True for failures that happened on the wire rather than in planning
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, DataBusError::RemoteTimeout { .. } | DataBusError::RemoteError { .. })
    }
}
