//! Scatter-gather engine
//!
//! Runs one future per remote call, all bounded by a single shared deadline,
//! and hands back the responses in call order.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::error::DataBusError;
use crate::remote::TransportError;

/// Await every call and return their responses in the order given
///
/// Each call is paired with the id of the remote it targets. The caller is
/// suspended until all calls settle or the deadline passes; there is no early
/// return on the first result. Any call still pending at the deadline fails
/// the whole gather with `RemoteTimeout`; otherwise the first transport
/// failure in call order fails it with `RemoteError`.
pub async fn gather<T, F>(calls: Vec<(String, F)>, timeout: Duration) -> Result<Vec<T>, DataBusError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    debug!(calls = calls.len(), ?timeout, "gather: called");
    let deadline = Instant::now() + timeout;

    let (remotes, futures): (Vec<String>, Vec<F>) = calls.into_iter().unzip();
    let settled = join_all(futures.into_iter().map(|call| timeout_at(deadline, call))).await;

    let mut timed_out = Vec::new();
    let mut first_failure = None;
    let mut responses = Vec::with_capacity(settled.len());
    for (remote, outcome) in remotes.into_iter().zip(settled) {
        match outcome {
            Err(_) => {
                debug!(%remote, "gather: deadline passed");
                timed_out.push(remote);
            }
            Ok(Err(source)) => {
                debug!(%remote, error = %source, "gather: transport failure");
                if first_failure.is_none() {
                    first_failure = Some(DataBusError::RemoteError { remote, source });
                }
            }
            Ok(Ok(response)) => responses.push(response),
        }
    }

    if !timed_out.is_empty() {
        warn!(remotes = ?timed_out, ?timeout, "gather: remotes did not settle in time");
        return Err(DataBusError::RemoteTimeout {
            remotes: timed_out,
            timeout,
        });
    }
    if let Some(err) = first_failure {
        warn!(error = %err, "gather: remote failed");
        return Err(err);
    }

    debug!(responses = responses.len(), "gather: all calls settled");
    Ok(responses)
}
