//! MatrixBus - scatter-gather data exchange for sharded matrix stores
//!
//! A logical matrix is spread over a list of remote workers according to a
//! partition descriptor. MatrixBus answers two requests against it:
//!
//! - **fetch:** read a sub-range of rows and columns, asking each owning
//!   worker only for its part and merging the answers
//! - **push:** split a matrix by partition, hand each worker its rows, and
//!   report whether every worker accepted them
//!
//! # Modules
//!
//! - [`bus`] - dispatch, gather, and reconcile (`DataBus`)
//! - [`keys`] - row/column key sets
//! - [`matrix`] - `Matrix` trait and `KeyedMatrix`
//! - [`partition`] - replicated, exclusive, and sharded descriptors
//! - [`protocol`] - request/response messages
//! - [`remote`] - `Remote` trait and transport errors
//! - [`worker`] - in-process `LocalWorker` actor
//! - [`config`] - configuration types and loading
//! - [`cluster`] - simulator cluster descriptions
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```ignore
//! use matrixbus::{DataBus, DataBusConfig, KeySet, PartitionDescriptor};
//!
//! let bus = DataBus::new(DataBusConfig::default());
//! let shards = PartitionDescriptor::sharded([KeySet::range(0, 50), KeySet::range(50, 100)]);
//! let rows = bus.fetch("weights", &KeySet::list([3, 70]), &KeySet::All, Some(&shards), &remotes).await?;
//! ```

pub mod bus;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod keys;
pub mod matrix;
pub mod partition;
pub mod protocol;
pub mod remote;
pub mod worker;

pub use bus::{DataBus, Dispatch, DispatchPlan, plan_fetch, plan_push};
pub use cluster::{ClusterSpec, as_remotes};
pub use config::{Config, DataBusConfig};
pub use error::DataBusError;
pub use keys::{KeySet, KeySetParseError};
pub use matrix::{KeyedMatrix, Matrix};
pub use partition::{Partition, PartitionDescriptor};
pub use protocol::{Data, PartialDataRequest, PushDataRequest, PushDataResponse};
pub use remote::{Remote, RemoteRef, TransportError};
pub use worker::{LocalWorker, WorkerOptions, WorkerStats};
