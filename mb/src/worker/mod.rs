//! In-process workers
//!
//! `LocalWorker` is an actor that owns a set of named matrices and answers
//! data bus requests through the `Remote` trait. It backs the `mb` simulator
//! and the end-to-end tests.

mod actor;
mod messages;

pub use actor::LocalWorker;
pub use messages::{WorkerOptions, WorkerStats};
