//! Client-level error type.

use thiserror::Error;

use crate::db::DbError;
use crate::http::NormalizedError;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Raised before dispatch by calls that need a signed-in user.
    #[error("No authentication token available")]
    MissingToken,

    #[error(transparent)]
    Request(#[from] NormalizedError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("HTTP client setup failed: {0}")]
    Setup(#[from] reqwest::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
