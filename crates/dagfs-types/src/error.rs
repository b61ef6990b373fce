use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid base58 hash {0:?}")]
    InvalidHash(String),

    #[error("invalid reference {0:?}")]
    InvalidReference(String),
}
