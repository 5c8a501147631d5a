//! DataBus: fetch and push across a partitioned remote list

use tracing::{debug, error, info};
use uuid::Uuid;

use super::dispatch::{plan_fetch, plan_push};
use super::engine::gather;
use super::reconcile::{all_pushed, merge_fetched};
use crate::config::DataBusConfig;
use crate::error::DataBusError;
use crate::keys::KeySet;
use crate::matrix::Matrix;
use crate::partition::PartitionDescriptor;
use crate::remote::RemoteRef;

/// Stateless scatter-gather coordinator
///
/// Holds only its configuration. Every call receives the partition descriptor
/// and remote list it works against, so concurrent calls never share state.
#[derive(Debug, Clone, Default)]
pub struct DataBus {
    config: DataBusConfig,
}

impl DataBus {
    pub fn new(config: DataBusConfig) -> Self {
        debug!(?config, "DataBus::new: called");
        Self { config }
    }

    /// Fetch `row_keys` x `col_keys` of `matrix_name`
    ///
    /// Fails if any remote times out or errors, or if no remote returned data.
    /// Under a sharded descriptor, rows owned by no partition are absent from
    /// the result.
    pub async fn fetch<M: Matrix>(
        &self,
        matrix_name: &str,
        row_keys: &KeySet,
        col_keys: &KeySet,
        partition: Option<&PartitionDescriptor>,
        remotes: &[RemoteRef<M>],
    ) -> Result<M, DataBusError> {
        let call_id = Uuid::now_v7();
        debug!(%call_id, %matrix_name, %row_keys, %col_keys, "DataBus::fetch: called");

        let plan = plan_fetch(matrix_name, row_keys, col_keys, partition, remotes.len())?;
        if plan.is_empty() {
            debug!(%call_id, "DataBus::fetch: no partition owns the requested rows");
            return Err(DataBusError::EmptyResultSet {
                matrix: matrix_name.to_string(),
            });
        }

        let calls: Vec<_> = plan
            .dispatches
            .into_iter()
            .map(|d| {
                let remote = &remotes[d.remote];
                (remote.id().to_string(), remote.fetch(d.request))
            })
            .collect();

        let result = gather(calls, self.config.timeout())
            .await
            .and_then(|responses| merge_fetched(matrix_name, responses));
        match &result {
            Ok(matrix) => info!(%call_id, %matrix_name, rows = matrix.row_count(), "DataBus::fetch: done"),
            Err(e) => error!(%call_id, %matrix_name, error = %e, "DataBus::fetch: failed"),
        }
        result
    }

    /// Push `matrix` into `matrix_name`
    ///
    /// Returns `Ok(false)` when every remote answered but at least one refused
    /// its rows. A sharded push whose partitions do not cover every payload row
    /// fails before any remote is contacted.
    pub async fn push<M: Matrix>(
        &self,
        matrix_name: &str,
        initialize_only: bool,
        matrix: M,
        partition: Option<&PartitionDescriptor>,
        remotes: &[RemoteRef<M>],
    ) -> Result<bool, DataBusError> {
        let call_id = Uuid::now_v7();
        debug!(%call_id, %matrix_name, initialize_only, rows = matrix.row_count(), "DataBus::push: called");

        let plan = plan_push(matrix_name, initialize_only, matrix, partition, remotes.len()).inspect_err(|e| {
            error!(%call_id, %matrix_name, error = %e, "DataBus::push: rejected before dispatch");
        })?;

        let calls: Vec<_> = plan
            .dispatches
            .into_iter()
            .map(|d| {
                let remote = &remotes[d.remote];
                (remote.id().to_string(), remote.push(d.request))
            })
            .collect();

        match gather(calls, self.config.timeout()).await {
            Ok(responses) => {
                let success = all_pushed(&responses);
                info!(%call_id, %matrix_name, remotes = responses.len(), success, "DataBus::push: done");
                Ok(success)
            }
            Err(e) => {
                error!(%call_id, %matrix_name, error = %e, "DataBus::push: failed");
                Err(e)
            }
        }
    }
}
