//! Common error types

use protocol::{PeripheralKind, PortId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} on port {port} does not support {operation}")]
    Unsupported {
        port: PortId,
        kind: PeripheralKind,
        operation: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Peripheral error: {0}")]
    Peripheral(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = Error::Unsupported {
            port: PortId(0x3c),
            kind: PeripheralKind::Voltage,
            operation: "power",
        };
        assert_eq!(err.to_string(), "VOLTAGE on port 0x3c does not support power");
    }
}
