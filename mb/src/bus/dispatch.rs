//! Topology dispatch: turn a partition descriptor into per-remote requests
//!
//! Planning is pure. Nothing here touches a remote, so a plan that fails
//! (bad topology, incomplete push coverage) fails before any request exists.

use tracing::{debug, warn};

use crate::error::DataBusError;
use crate::keys::KeySet;
use crate::matrix::Matrix;
use crate::partition::PartitionDescriptor;
use crate::protocol::{PartialDataRequest, PushDataRequest};

/// One request bound for `remotes[remote]`
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch<R> {
    pub remote: usize,
    pub request: R,
}

/// Ordered requests for one fetch or push
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan<R> {
    pub dispatches: Vec<Dispatch<R>>,

    /// Requested rows no partition owns; `None` when the request is unbounded
    pub unowned_rows: Option<usize>,
}

impl<R> DispatchPlan<R> {
    fn single(remote: usize, request: R) -> Self {
        Self {
            dispatches: vec![Dispatch { remote, request }],
            unowned_rows: Some(0),
        }
    }

    pub fn len(&self) -> usize {
        self.dispatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty()
    }

    /// Remote indices in dispatch order
    pub fn targets(&self) -> Vec<usize> {
        self.dispatches.iter().map(|d| d.remote).collect()
    }
}

/// Plan a fetch of `row_keys` x `col_keys`
///
/// Sharded fetches ask each partition only for the rows it owns and skip
/// partitions with nothing to contribute. Requested rows outside every
/// partition are dropped and counted in `unowned_rows`.
pub fn plan_fetch(
    matrix_name: &str,
    row_keys: &KeySet,
    col_keys: &KeySet,
    partition: Option<&PartitionDescriptor>,
    remote_count: usize,
) -> Result<DispatchPlan<PartialDataRequest>, DataBusError> {
    debug!(%matrix_name, %row_keys, %col_keys, ?partition, remote_count, "plan_fetch: called");
    let replicated = PartitionDescriptor::Replicated;
    let descriptor = partition.unwrap_or(&replicated);
    descriptor.validate(remote_count)?;

    let request = |rows: KeySet| PartialDataRequest {
        matrix_name: matrix_name.to_string(),
        row_keys: rows,
        col_keys: col_keys.clone(),
    };

    match descriptor {
        PartitionDescriptor::Replicated => {
            debug!("plan_fetch: replicated, asking remote 0");
            Ok(DispatchPlan::single(0, request(row_keys.clone())))
        }
        PartitionDescriptor::Exclusive { index } => {
            debug!(%index, "plan_fetch: exclusive");
            Ok(DispatchPlan::single(*index, request(row_keys.clone())))
        }
        PartitionDescriptor::Sharded { partitions } => {
            let mut dispatches = Vec::new();
            let mut owned = 0usize;
            for (index, part) in partitions.iter().enumerate() {
                let keys = part.keys.intersect(row_keys);
                debug!(%index, partition_keys = %part.keys, intersect = %keys, "plan_fetch: checked partition");
                if keys.is_empty() {
                    continue;
                }
                owned += keys.len().unwrap_or(0);
                dispatches.push(Dispatch {
                    remote: index,
                    request: request(keys),
                });
            }

            let unowned_rows = row_keys.len().map(|requested| requested.saturating_sub(owned));
            if let Some(dropped) = unowned_rows.filter(|n| *n > 0) {
                warn!(%matrix_name, dropped, "plan_fetch: requested rows owned by no partition were dropped");
            }

            Ok(DispatchPlan {
                dispatches,
                unowned_rows,
            })
        }
    }
}

/// Plan a push of `matrix`
///
/// Sharded pushes split the payload by partition. If the partitions do not
/// account for every payload row the plan fails with
/// `IncompletePartitionCoverage` and nothing is sent to any remote.
pub fn plan_push<M: Matrix>(
    matrix_name: &str,
    initialize_only: bool,
    matrix: M,
    partition: Option<&PartitionDescriptor>,
    remote_count: usize,
) -> Result<DispatchPlan<PushDataRequest<M>>, DataBusError> {
    debug!(%matrix_name, initialize_only, rows = matrix.row_count(), ?partition, remote_count, "plan_push: called");
    let replicated = PartitionDescriptor::Replicated;
    let descriptor = partition.unwrap_or(&replicated);
    descriptor.validate(remote_count)?;

    let request = |matrix: M| PushDataRequest {
        matrix_name: matrix_name.to_string(),
        initialize_only,
        matrix,
    };

    match descriptor {
        PartitionDescriptor::Replicated => {
            debug!("plan_push: replicated, pushing to remote 0");
            Ok(DispatchPlan::single(0, request(matrix)))
        }
        PartitionDescriptor::Exclusive { index } => {
            debug!(%index, "plan_push: exclusive");
            Ok(DispatchPlan::single(*index, request(matrix)))
        }
        PartitionDescriptor::Sharded { partitions } => {
            let total = matrix.row_count();
            let mut dispatched = 0usize;
            let mut dispatches = Vec::new();
            for (index, part) in partitions.iter().enumerate() {
                let subset = matrix.sub_matrix(&part.keys, &KeySet::All);
                let rows = subset.row_count();
                debug!(%index, partition_keys = %part.keys, rows, "plan_push: split partition");
                if rows == 0 {
                    continue;
                }
                dispatched += rows;
                dispatches.push(Dispatch {
                    remote: index,
                    request: request(subset),
                });
            }

            if dispatched < total {
                warn!(%matrix_name, dispatched, total, "plan_push: partitions do not cover the payload");
                return Err(DataBusError::IncompletePartitionCoverage {
                    matrix: matrix_name.to_string(),
                    dispatched,
                    total,
                });
            }

            Ok(DispatchPlan {
                dispatches,
                unowned_rows: Some(0),
            })
        }
    }
}
