//! Hub runtime error types

use protocol::{PortId, Role};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    /// Port table maps the same port twice
    #[error("Port {0} appears more than once in the port table")]
    DuplicatePort(PortId),

    /// Port table binds the same role to two ports
    #[error("Role {0} is mapped to more than one port")]
    DuplicateRole(Role),

    /// Secondary roles are populated by capability, never by port table
    #[error("Role {0} cannot be bound to a port")]
    SecondaryRole(Role),

    /// Command issued against a role slot that was never populated
    #[error("No peripheral attached for role {0}")]
    MissingPeripheral(Role),

    /// Percentage argument outside its accepted range
    #[error("{what} {value} outside [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    /// Connection layer did not hand over its event stream
    #[error("Connection to {0} has no event stream")]
    NoEventStream(String),

    /// Error reported by a peripheral or the connection layer
    #[error(transparent)]
    Peripheral(#[from] common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HubError>;

/// Check that `value` lies in `[min, max]`
pub(crate) fn check_range(what: &'static str, value: i32, min: i32, max: i32) -> Result<i32> {
    if value < min || value > max {
        return Err(HubError::OutOfRange {
            what,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
