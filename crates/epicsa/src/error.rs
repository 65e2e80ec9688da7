//! Error types for the bridge.

use thiserror::Error;

/// Errors surfaced by the wrapper functions.
#[derive(Error, Debug)]
pub enum EpicsaError {
    /// An argument was rejected before any R call was attempted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// R session or data-environment initialization failed.
    #[error("R session error: {0}")]
    Session(String),

    /// An error from the R object layer or from the R call itself.
    #[error(transparent)]
    Harp(#[from] epicsa_harp::HarpError),
}

/// Result type for bridge operations.
pub type EpicsaResult<T> = Result<T, EpicsaError>;
