//! Data exchange coordinator
//!
//! A fetch or push runs in three stages:
//! - **Dispatch:** read the partition descriptor and build per-remote requests
//! - **Gather:** run the requests concurrently under one shared deadline
//! - **Reconcile:** merge fetched partials, or fold push success flags

mod core;
pub mod dispatch;
pub mod engine;
pub mod reconcile;

pub use self::core::DataBus;
pub use dispatch::{Dispatch, DispatchPlan, plan_fetch, plan_push};
pub use engine::gather;
pub use reconcile::{all_pushed, merge_fetched};
