//! Remote endpoint trait
//!
//! A `Remote` is anything that can answer fetch and push requests for one
//! partition: an in-process worker, a network client, a test double.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::matrix::Matrix;
use crate::protocol::{Data, PartialDataRequest, PushDataRequest, PushDataResponse};

/// Transport-level failures talking to a remote
///
/// An explicit `success = false` on a push is not a transport failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Remote {remote} is disconnected")]
    Disconnected { remote: String },

    #[error("Remote {remote} rejected the request: {reason}")]
    Rejected { remote: String, reason: String },

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Addressable handle to a worker holding matrix data
#[async_trait]
pub trait Remote<M: Matrix>: Send + Sync {
    /// Stable name used in logs and errors
    fn id(&self) -> &str;

    async fn fetch(&self, request: PartialDataRequest) -> Result<Data<M>, TransportError>;

    async fn push(&self, request: PushDataRequest<M>) -> Result<PushDataResponse, TransportError>;
}

/// Shared remote handle as held in a remote list
pub type RemoteRef<M> = Arc<dyn Remote<M>>;

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tracing::debug;

    /// What a scripted remote does when called
    #[derive(Debug, Clone)]
    pub enum Script<M> {
        Answer(Option<M>),
        Push(bool),
        Fail(TransportError),
        Hang,
    }

    /// Remote double that records requests and replies from a script
    pub struct ScriptedRemote<M: Matrix> {
        id: String,
        delay: Duration,
        fetch_script: Script<M>,
        push_script: Script<M>,
        fetched: Mutex<Vec<PartialDataRequest>>,
        pushed: Mutex<Vec<PushDataRequest<M>>>,
    }

    impl<M: Matrix> ScriptedRemote<M> {
        pub fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                delay: Duration::ZERO,
                fetch_script: Script::Answer(None),
                push_script: Script::Push(true),
                fetched: Mutex::new(Vec::new()),
                pushed: Mutex::new(Vec::new()),
            }
        }

        pub fn answering(mut self, matrix: M) -> Self {
            self.fetch_script = Script::Answer(Some(matrix));
            self
        }

        pub fn pushing(mut self, success: bool) -> Self {
            self.push_script = Script::Push(success);
            self
        }

        pub fn failing(mut self, error: TransportError) -> Self {
            self.fetch_script = Script::Fail(error.clone());
            self.push_script = Script::Fail(error);
            self
        }

        pub fn hanging(mut self) -> Self {
            self.fetch_script = Script::Hang;
            self.push_script = Script::Hang;
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn fetched(&self) -> Vec<PartialDataRequest> {
            self.fetched.lock().map(|v| v.clone()).unwrap_or_default()
        }

        pub fn pushed(&self) -> Vec<PushDataRequest<M>> {
            self.pushed.lock().map(|v| v.clone()).unwrap_or_default()
        }

        async fn settle(&self) {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }

    #[async_trait]
    impl<M: Matrix> Remote<M> for ScriptedRemote<M> {
        fn id(&self) -> &str {
            &self.id
        }

        async fn fetch(&self, request: PartialDataRequest) -> Result<Data<M>, TransportError> {
            debug!(id = %self.id, rows = %request.row_keys, "ScriptedRemote::fetch: called");
            if let Ok(mut fetched) = self.fetched.lock() {
                fetched.push(request);
            }
            self.settle().await;
            match &self.fetch_script {
                Script::Answer(matrix) => Ok(Data { matrix: matrix.clone() }),
                Script::Fail(error) => Err(error.clone()),
                Script::Hang => std::future::pending().await,
                Script::Push(_) => Err(TransportError::Unavailable("push-only script".to_string())),
            }
        }

        async fn push(&self, request: PushDataRequest<M>) -> Result<PushDataResponse, TransportError> {
            debug!(id = %self.id, rows = request.matrix.row_count(), "ScriptedRemote::push: called");
            if let Ok(mut pushed) = self.pushed.lock() {
                pushed.push(request);
            }
            self.settle().await;
            match &self.push_script {
                Script::Push(success) => Ok(PushDataResponse { success: *success }),
                Script::Fail(error) => Err(error.clone()),
                Script::Hang => std::future::pending().await,
                Script::Answer(_) => Err(TransportError::Unavailable("fetch-only script".to_string())),
            }
        }
    }

    /// Count requests per remote id, for assertions on fan-out
    pub fn request_counts<M: Matrix>(remotes: &[Arc<ScriptedRemote<M>>]) -> HashMap<String, usize> {
        remotes
            .iter()
            .map(|r| (r.id.clone(), r.fetched().len() + r.pushed().len()))
            .collect()
    }
}
