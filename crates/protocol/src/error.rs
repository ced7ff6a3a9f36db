//! Protocol error types

use thiserror::Error;

/// Errors raised while interpreting hub identifiers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Color name or index outside the palette
    #[error("Unknown color: {0}")]
    UnknownColor(String),

    /// Role slot name not known to any hub model
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Attached IO event code outside the defined range
    #[error("Unknown IO event code: {0:#04x}")]
    UnknownIoEvent(u8),
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
