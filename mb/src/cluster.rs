//! Cluster descriptions for the simulator
//!
//! A cluster file names one matrix, how many in-process workers to boot, and
//! the partition descriptor that spreads the matrix over them.
//!
//! ```yaml
//! matrix: weights
//! columns: [0, 1, 2]
//! workers: 2
//! partition:
//!   type: sharded
//!   partitions:
//!     - keys: { range: { start: 0, end: 50 } }
//!     - keys: { range: { start: 50, end: 100 } }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keys::KeySet;
use crate::matrix::KeyedMatrix;
use crate::partition::PartitionDescriptor;
use crate::remote::RemoteRef;
use crate::worker::{LocalWorker, WorkerOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterSpec {
    /// Matrix name used in every request
    pub matrix: String,

    /// Column keys of generated rows
    #[serde(default = "default_columns")]
    pub columns: Vec<u64>,

    /// Number of workers to boot
    pub workers: usize,

    /// Missing means replicated
    #[serde(default)]
    pub partition: Option<PartitionDescriptor>,

    /// Simulated latency on every worker
    #[serde(default)]
    pub latency_ms: u64,

    /// Indices of workers that refuse pushes
    #[serde(default)]
    pub reject_pushes: Vec<usize>,
}

fn default_columns() -> Vec<u64> {
    vec![0]
}

impl ClusterSpec {
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "ClusterSpec::load: called");
        let content = fs::read_to_string(path).context(format!("Failed to read cluster file {}", path.display()))?;
        Self::parse(&content).context(format!("Failed to parse cluster file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let spec: Self = serde_yaml::from_str(content)?;
        if spec.workers == 0 {
            return Err(eyre!("Cluster must have at least one worker"));
        }
        Ok(spec)
    }

    /// Boot one `LocalWorker` per configured worker, named `worker-<i>`
    pub fn spawn_workers(&self) -> Vec<LocalWorker> {
        debug!(workers = self.workers, "ClusterSpec::spawn_workers: called");
        (0..self.workers)
            .map(|i| {
                let options = WorkerOptions {
                    latency: Duration::from_millis(self.latency_ms),
                    reject_pushes: self.reject_pushes.contains(&i),
                    ..Default::default()
                };
                LocalWorker::spawn(format!("worker-{}", i), options)
            })
            .collect()
    }

    /// Deterministic payload for `rows`: cell (r, c) holds `r + c / 1000`
    pub fn generate(&self, rows: &KeySet) -> Result<KeyedMatrix> {
        let keys = rows
            .iter()
            .ok_or_else(|| eyre!("Cannot generate an unbounded row set; give a range or list"))?;
        Ok(KeyedMatrix::from_rows(keys.map(|r| {
            let values: Vec<(u64, f64)> = self.columns.iter().map(|c| (*c, r as f64 + *c as f64 / 1000.0)).collect();
            (r, values)
        })))
    }
}

/// Erase worker handles into the remote list the data bus takes
pub fn as_remotes(workers: &[LocalWorker]) -> Vec<RemoteRef<KeyedMatrix>> {
    workers
        .iter()
        .map(|w| std::sync::Arc::new(w.clone()) as RemoteRef<KeyedMatrix>)
        .collect()
}
