//! Test utilities for lego-hub-rs
//!
//! Provides mock peripherals and helper functions for testing across crates.
//!
//! # Example
//!
//! ```
//! use common::test_utils::mock_peripheral;
//! use protocol::{PeripheralKind, PortId};
//!
//! let p = mock_peripheral(PortId(0x32), PeripheralKind::RgbLight);
//! assert_eq!(p.port(), PortId(0x32));
//! ```

use crate::channel::AttachEvent;
use crate::peripheral::{Peripheral, PeripheralHandle};
use protocol::{PeripheralKind, PortId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default test timeout (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Peripheral that only knows its port and kind
///
/// Every capability call fails with `Unsupported`; use it where a test only
/// cares about slot identity.
#[derive(Debug)]
pub struct MockPeripheral {
    port: PortId,
    kind: PeripheralKind,
}

impl Peripheral for MockPeripheral {
    fn port(&self) -> PortId {
        self.port
    }

    fn kind(&self) -> PeripheralKind {
        self.kind
    }
}

/// Create a mock peripheral handle
pub fn mock_peripheral(port: PortId, kind: PeripheralKind) -> PeripheralHandle {
    Arc::new(MockPeripheral { port, kind })
}

/// Create an attach event carrying a fresh mock peripheral
pub fn mock_attach(port: u8, kind: PeripheralKind) -> AttachEvent {
    let port = PortId(port);
    AttachEvent::attached(port, kind, mock_peripheral(port, kind))
}

/// Compare two handles by identity
pub fn same_handle(a: &PeripheralHandle, b: &PeripheralHandle) -> bool {
    Arc::ptr_eq(a, b)
}

/// Timeout wrapper for async tests
///
/// Wraps an async operation with a timeout to prevent tests from hanging.
pub async fn with_timeout<T, F>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError { duration })
}

/// Error returned when a test times out
#[derive(Debug)]
pub struct TimeoutError {
    /// The timeout duration that was exceeded
    pub duration: Duration,
}

impl std::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Test timed out after {:?}", self.duration)
    }
}

impl std::error::Error for TimeoutError {}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::IoEvent;

    #[test]
    fn test_mock_attach() {
        let event = mock_attach(0x3c, PeripheralKind::Voltage);
        assert_eq!(event.port, PortId(0x3c));
        assert_eq!(event.io_event(), IoEvent::Attached);
    }

    #[test]
    fn test_same_handle() {
        let a = mock_peripheral(PortId(0), PeripheralKind::Motor);
        let b = mock_peripheral(PortId(0), PeripheralKind::Motor);
        assert!(same_handle(&a, &a.clone()));
        assert!(!same_handle(&a, &b));
    }

    #[tokio::test]
    async fn test_with_timeout_failure() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            42
        })
        .await;

        assert!(result.is_err());
    }
}
