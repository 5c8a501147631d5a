//! Result reconciliation for fetch and push

use tracing::debug;

use crate::error::DataBusError;
use crate::matrix::Matrix;
use crate::protocol::{Data, PushDataResponse};

/// Merge partial fetch results into one matrix
///
/// Responses without data are skipped. The first remaining matrix is the
/// accumulator and the rest are merged into it in response order.
pub fn merge_fetched<M: Matrix>(matrix_name: &str, responses: Vec<Data<M>>) -> Result<M, DataBusError> {
    debug!(%matrix_name, responses = responses.len(), "merge_fetched: called");
    let mut parts: Vec<M> = responses.into_iter().filter_map(|data| data.matrix).collect();

    if parts.is_empty() {
        debug!("merge_fetched: nothing to merge");
        return Err(DataBusError::EmptyResultSet {
            matrix: matrix_name.to_string(),
        });
    }

    let mut merged = parts.remove(0);
    if !parts.is_empty() {
        debug!(others = parts.len(), "merge_fetched: merging partials");
        merged.merge_matrices(parts);
    }
    Ok(merged)
}

/// True only if every remote accepted its rows
pub fn all_pushed(responses: &[PushDataResponse]) -> bool {
    let refused = responses.iter().filter(|r| !r.success).count();
    debug!(responses = responses.len(), refused, "all_pushed: called");
    refused == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeySet;
    use crate::matrix::KeyedMatrix;

    fn rows(keys: &[u64]) -> KeyedMatrix {
        KeyedMatrix::from_rows(keys.iter().map(|k| (*k, vec![(0, *k as f64 * 10.0)])))
    }

    #[test]
    fn test_single_response_returned_unchanged() {
        let only = rows(&[1, 2, 3]);
        let merged = merge_fetched("m", vec![Data::new(only.clone())]).unwrap();
        assert_eq!(merged, only);
    }

    #[test]
    fn test_partials_are_unioned() {
        let merged = merge_fetched("m", vec![Data::new(rows(&[2])), Data::new(rows(&[3]))]).unwrap();
        assert_eq!(merged.row_keys(), KeySet::list([2, 3]));
        assert_eq!(merged.get(3, 0), Some(30.0));
    }

    #[test]
    fn test_missing_payloads_are_skipped() {
        let merged = merge_fetched("m", vec![Data::missing(), Data::new(rows(&[4]))]).unwrap();
        assert_eq!(merged, rows(&[4]));
    }

    #[test]
    fn test_nothing_usable_is_empty_result_set() {
        let err = merge_fetched::<KeyedMatrix>("weights", vec![Data::missing()]).unwrap_err();
        assert!(matches!(err, DataBusError::EmptyResultSet { matrix } if matrix == "weights"));

        let err = merge_fetched::<KeyedMatrix>("weights", vec![]).unwrap_err();
        assert!(matches!(err, DataBusError::EmptyResultSet { .. }));
    }

    #[test]
    fn test_all_pushed() {
        assert!(all_pushed(&[PushDataResponse::ok(), PushDataResponse::ok()]));
        assert!(!all_pushed(&[PushDataResponse::ok(), PushDataResponse::refused()]));
        assert!(all_pushed(&[]));
    }
}
