//! LocalWorker - in-process remote that owns a matrix store
//!
//! The store lives inside a tokio task and is reached only through the
//! command channel, so a worker handle can be cloned freely.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::messages::{WorkerCommand, WorkerOptions, WorkerStats};
use crate::matrix::{KeyedMatrix, Matrix};
use crate::protocol::{Data, PartialDataRequest, PushDataRequest, PushDataResponse};
use crate::remote::{Remote, TransportError};

/// Handle to a spawned worker actor
#[derive(Debug, Clone)]
pub struct LocalWorker {
    id: String,
    tx: mpsc::Sender<WorkerCommand>,
    options: WorkerOptions,
}

impl LocalWorker {
    /// Spawn a worker actor on the current runtime
    pub fn spawn(id: impl Into<String>, options: WorkerOptions) -> Self {
        let id = id.into();
        debug!(%id, ?options, "LocalWorker::spawn: called");
        let (tx, rx) = mpsc::channel(options.channel_buffer.max(1));
        tokio::spawn(actor_loop(id.clone(), options.reject_pushes, rx));
        info!(%id, "LocalWorker spawned");
        Self { id, tx, options }
    }

    /// Store `matrix` under `name`, replacing any existing copy
    pub async fn load(&self, name: &str, matrix: KeyedMatrix) -> Result<(), TransportError> {
        debug!(id = %self.id, %name, rows = matrix.row_count(), "LocalWorker::load: called");
        self.ask(|reply| WorkerCommand::Load {
            name: name.to_string(),
            matrix,
            reply,
        })
        .await
    }

    pub async fn snapshot(&self, name: &str) -> Result<Option<KeyedMatrix>, TransportError> {
        debug!(id = %self.id, %name, "LocalWorker::snapshot: called");
        self.ask(|reply| WorkerCommand::Snapshot {
            name: name.to_string(),
            reply,
        })
        .await
    }

    pub async fn stats(&self) -> Result<WorkerStats, TransportError> {
        debug!(id = %self.id, "LocalWorker::stats: called");
        self.ask(|reply| WorkerCommand::Stats { reply }).await
    }

    /// Stop the actor; later requests fail with `Disconnected`
    pub async fn shutdown(&self) -> Result<(), TransportError> {
        debug!(id = %self.id, "LocalWorker::shutdown: called");
        self.tx.send(WorkerCommand::Shutdown).await.map_err(|_| self.disconnected())
    }

    async fn ask<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> WorkerCommand) -> Result<T, TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| self.disconnected())?;
        reply_rx.await.map_err(|_| self.disconnected())
    }

    async fn simulate_latency(&self) {
        if !self.options.latency.is_zero() {
            tokio::time::sleep(self.options.latency).await;
        }
    }

    fn disconnected(&self) -> TransportError {
        TransportError::Disconnected { remote: self.id.clone() }
    }
}

#[async_trait]
impl Remote<KeyedMatrix> for LocalWorker {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, request: PartialDataRequest) -> Result<Data<KeyedMatrix>, TransportError> {
        debug!(id = %self.id, matrix = %request.matrix_name, rows = %request.row_keys, "LocalWorker::fetch: called");
        self.simulate_latency().await;
        self.ask(|reply| WorkerCommand::Fetch { request, reply }).await
    }

    async fn push(&self, request: PushDataRequest<KeyedMatrix>) -> Result<PushDataResponse, TransportError> {
        debug!(
            id = %self.id,
            matrix = %request.matrix_name,
            rows = request.matrix.row_count(),
            "LocalWorker::push: called"
        );
        self.simulate_latency().await;
        self.ask(|reply| WorkerCommand::Push { request, reply }).await
    }
}

async fn actor_loop(id: String, reject_pushes: bool, mut rx: mpsc::Receiver<WorkerCommand>) {
    debug!(%id, "actor_loop: called");
    let mut store: HashMap<String, KeyedMatrix> = HashMap::new();
    let mut stats = WorkerStats::default();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCommand::Fetch { request, reply } => {
                stats.fetches += 1;
                let data = match store.get(&request.matrix_name) {
                    Some(matrix) => {
                        let part = matrix.sub_matrix(&request.row_keys, &request.col_keys);
                        stats.rows_served += part.row_count() as u64;
                        Data::new(part)
                    }
                    None => {
                        debug!(%id, matrix = %request.matrix_name, "actor_loop: Fetch for unknown matrix");
                        Data::missing()
                    }
                };
                let _ = reply.send(data);
            }

            WorkerCommand::Push { request, reply } => {
                stats.pushes += 1;
                if reject_pushes {
                    debug!(%id, matrix = %request.matrix_name, "actor_loop: Push refused");
                    stats.refused_pushes += 1;
                    let _ = reply.send(PushDataResponse::refused());
                    continue;
                }
                let target = store.entry(request.matrix_name).or_default();
                let written = if request.initialize_only {
                    target.insert_absent_rows(request.matrix)
                } else {
                    target.upsert_rows(request.matrix)
                };
                debug!(%id, written, initialize_only = request.initialize_only, "actor_loop: Push stored");
                stats.rows_stored += written as u64;
                let _ = reply.send(PushDataResponse::ok());
            }

            WorkerCommand::Load { name, matrix, reply } => {
                debug!(%id, %name, "actor_loop: Load command");
                store.insert(name, matrix);
                let _ = reply.send(());
            }

            WorkerCommand::Snapshot { name, reply } => {
                let _ = reply.send(store.get(&name).cloned());
            }

            WorkerCommand::Stats { reply } => {
                let _ = reply.send(stats);
            }

            WorkerCommand::Shutdown => {
                debug!(%id, "actor_loop: Shutdown command");
                break;
            }
        }
    }

    info!(%id, "LocalWorker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeySet;
    use std::time::Duration;

    fn seed() -> KeyedMatrix {
        KeyedMatrix::from_rows([(1, vec![(0, 1.0), (1, 10.0)]), (2, vec![(0, 2.0), (1, 20.0)])])
    }

    fn fetch_request(rows: KeySet, cols: KeySet) -> PartialDataRequest {
        PartialDataRequest {
            matrix_name: "m".to_string(),
            row_keys: rows,
            col_keys: cols,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_requested_slice() {
        let worker = LocalWorker::spawn("w0", WorkerOptions::default());
        worker.load("m", seed()).await.unwrap();

        let data = worker
            .fetch(fetch_request(KeySet::list([2]), KeySet::list([1])))
            .await
            .unwrap();
        let matrix = data.matrix.unwrap();
        assert_eq!(matrix.row_keys(), KeySet::list([2]));
        assert_eq!(matrix.get(2, 1), Some(20.0));
        assert_eq!(matrix.get(2, 0), None);

        let stats = worker.stats().await.unwrap();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.rows_served, 1);
    }

    #[tokio::test]
    async fn test_fetch_unknown_matrix_has_no_data() {
        let worker = LocalWorker::spawn("w0", WorkerOptions::default());
        let data = worker.fetch(fetch_request(KeySet::All, KeySet::All)).await.unwrap();
        assert!(data.matrix.is_none());
    }

    #[tokio::test]
    async fn test_push_overwrites_and_initialize_only_keeps() {
        let worker = LocalWorker::spawn("w0", WorkerOptions::default());
        worker.load("m", seed()).await.unwrap();

        let init = PushDataRequest {
            matrix_name: "m".to_string(),
            initialize_only: true,
            matrix: KeyedMatrix::from_rows([(1, vec![(0, -1.0)]), (3, vec![(0, 3.0)])]),
        };
        assert!(worker.push(init).await.unwrap().success);
        let stored = worker.snapshot("m").await.unwrap().unwrap();
        assert_eq!(stored.get(1, 0), Some(1.0));
        assert_eq!(stored.get(3, 0), Some(3.0));

        let overwrite = PushDataRequest {
            matrix_name: "m".to_string(),
            initialize_only: false,
            matrix: KeyedMatrix::from_rows([(1, vec![(0, -1.0)])]),
        };
        assert!(worker.push(overwrite).await.unwrap().success);
        let stored = worker.snapshot("m").await.unwrap().unwrap();
        assert_eq!(stored.get(1, 0), Some(-1.0));
        assert_eq!(worker.stats().await.unwrap().rows_stored, 2);
    }

    #[tokio::test]
    async fn test_rejecting_worker_refuses_push() {
        let options = WorkerOptions {
            reject_pushes: true,
            ..Default::default()
        };
        let worker = LocalWorker::spawn("w0", options);
        let push = PushDataRequest {
            matrix_name: "m".to_string(),
            initialize_only: false,
            matrix: seed(),
        };
        assert!(!worker.push(push).await.unwrap().success);
        assert!(worker.snapshot("m").await.unwrap().is_none());
        assert_eq!(worker.stats().await.unwrap().refused_pushes, 1);
    }

    #[tokio::test]
    async fn test_shutdown_disconnects() {
        let worker = LocalWorker::spawn("w0", WorkerOptions::default());
        worker.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = worker.fetch(fetch_request(KeySet::All, KeySet::All)).await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Disconnected {
                remote: "w0".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_latency_delays_reply() {
        let options = WorkerOptions {
            latency: Duration::from_millis(50),
            ..Default::default()
        };
        let worker = LocalWorker::spawn("w0", options);
        let started = std::time::Instant::now();
        worker.fetch(fetch_request(KeySet::All, KeySet::All)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
