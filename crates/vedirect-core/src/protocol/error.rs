//! Protocol errors

use thiserror::Error;

use super::FieldId;

/// Errors that can occur while probing the link or reading a field
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("No data received for {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Label '{label}' not seen within {lines} lines")]
    NotFound { label: &'static str, lines: u32 },

    #[error("Buffer overflow: line exceeds {capacity} bytes")]
    BufferOverrun { capacity: usize },

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: FieldId, value: String },

    #[error("Serial link is not open")]
    NotConnected,

    #[error("Device silent after {settle_ms}ms settle delay")]
    Silent { settle_ms: u64 },

    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    /// True for the outcomes a caller would normally retry on the next poll
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReadError::Timeout { .. }
                | ReadError::NotFound { .. }
                | ReadError::BufferOverrun { .. }
                | ReadError::InvalidValue { .. }
        )
    }
}
