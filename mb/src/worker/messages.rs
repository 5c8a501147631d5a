//! Local worker messages
//!
//! Commands and replies for the worker actor.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::matrix::KeyedMatrix;
use crate::protocol::{Data, PartialDataRequest, PushDataRequest, PushDataResponse};

/// Commands sent to a worker actor
#[derive(Debug)]
pub(crate) enum WorkerCommand {
    Fetch {
        request: PartialDataRequest,
        reply: oneshot::Sender<Data<KeyedMatrix>>,
    },
    Push {
        request: PushDataRequest<KeyedMatrix>,
        reply: oneshot::Sender<PushDataResponse>,
    },

    /// Seed a matrix, bypassing push refusal
    Load {
        name: String,
        matrix: KeyedMatrix,
        reply: oneshot::Sender<()>,
    },

    /// Copy of a stored matrix
    Snapshot {
        name: String,
        reply: oneshot::Sender<Option<KeyedMatrix>>,
    },
    Stats {
        reply: oneshot::Sender<WorkerStats>,
    },

    Shutdown,
}

/// Per-worker request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub fetches: u64,
    pub pushes: u64,
    pub refused_pushes: u64,
    pub rows_served: u64,
    pub rows_stored: u64,
}

/// Behaviour knobs for a local worker
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Simulated one-way transport latency applied to fetch and push
    pub latency: Duration,

    /// Answer every push with `success = false`
    pub reject_pushes: bool,

    /// Command channel capacity
    pub channel_buffer: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            reject_pushes: false,
            channel_buffer: 64,
        }
    }
}
