use crate::store::StoreError;
use thiserror::Error;

/// Outcome of a failed lookup, as seen by the caller.
///
/// The `Display` text of each variant is the public message; internal
/// details stay in the `Internal` source and only reach the logs.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid id: must be exactly 4 chars [a-z0-9]")]
    InvalidInput,

    #[error("malformed request")]
    MalformedRequest,

    #[error("not found")]
    NotFound,

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl LookupError {
    pub fn status_code(&self) -> u16 {
        match self {
            LookupError::InvalidInput | LookupError::MalformedRequest => 400,
            LookupError::NotFound => 404,
            LookupError::Internal(_) => 500,
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        LookupError::Internal(err.into())
    }
}

impl From<StoreError> for LookupError {
    fn from(err: StoreError) -> Self {
        LookupError::Internal(err.into())
    }
}
