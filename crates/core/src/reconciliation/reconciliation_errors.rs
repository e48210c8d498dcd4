use thiserror::Error;

/// Errors raised while building or applying conflict resolutions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationError {
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Resolution targets account '{found}' but the ledger tracks '{expected}'")]
    AccountMismatch { expected: String, found: String },
}
