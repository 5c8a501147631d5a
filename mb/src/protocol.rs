//! Request/response messages exchanged with remotes
//!
//! Plain serde types so any transport can carry them.

use serde::{Deserialize, Serialize};

use crate::keys::KeySet;

/// Ask a remote for a sub-range of a matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartialDataRequest {
    pub matrix_name: String,
    pub row_keys: KeySet,
    pub col_keys: KeySet,
}

/// Reply to a `PartialDataRequest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data<M> {
    pub matrix: Option<M>,
}

impl<M> Data<M> {
    pub fn new(matrix: M) -> Self {
        Self { matrix: Some(matrix) }
    }

    pub fn missing() -> Self {
        Self { matrix: None }
    }
}

/// Hand rows to a remote for storage
///
/// `initialize_only` is passed through untouched; the remote decides what it
/// means for its store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PushDataRequest<M> {
    pub matrix_name: String,
    pub initialize_only: bool,
    pub matrix: M,
}

/// Reply to a `PushDataRequest`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushDataResponse {
    pub success: bool,
}

impl PushDataResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn refused() -> Self {
        Self { success: false }
    }
}
