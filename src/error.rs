use thiserror::Error;

/// Failures of the transfer engine.
///
/// `InvalidArgument` is always raised before any byte moves. `PayloadTooLarge`
/// is raised only after the transient store has been removed.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("File size {received} exceeds expected size {expected}")]
    PayloadTooLarge { received: u64, expected: u64 },

    #[error("transfer I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    pub fn out_of_range(name: &str, value: u64, min: u64, max: u64) -> Self {
        TransferError::InvalidArgument(format!(
            "{name} must be between {min} and {max} bytes, got {value}"
        ))
    }

    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, TransferError::Io(_))
    }
}

pub type TransferResult<T> = Result<T, TransferError>;
