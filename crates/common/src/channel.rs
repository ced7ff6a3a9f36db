//! Attach-event channel between a hub connection and the hub runtime
//!
//! The connection layer pushes events from its own notification thread; the
//! hub's dispatcher thread drains them in arrival order.

use crate::peripheral::PeripheralHandle;
use async_channel::{Receiver, Sender, bounded};
use protocol::{IoEvent, PeripheralKind, PortId};
use std::fmt;

/// Capacity of the attach-event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What happened on a port
#[derive(Clone)]
pub enum AttachChange {
    /// A peripheral became present; the connection already built its handle
    Attached {
        /// Capability tag of the handle
        kind: PeripheralKind,
        /// Handle constructed by the connection layer
        peripheral: PeripheralHandle,
        /// Whether the port is a virtual (combined) port
        virtual_port: bool,
    },

    /// The peripheral on the port went away
    Detached,
}

impl fmt::Debug for AttachChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachChange::Attached {
                kind, virtual_port, ..
            } => f
                .debug_struct("Attached")
                .field("kind", kind)
                .field("virtual_port", virtual_port)
                .finish(),
            AttachChange::Detached => f.write_str("Detached"),
        }
    }
}

/// Attach or detach notification for one port
#[derive(Debug, Clone)]
pub struct AttachEvent {
    pub port: PortId,
    pub change: AttachChange,
}

impl AttachEvent {
    /// Peripheral attached to a physical port
    pub fn attached(port: PortId, kind: PeripheralKind, peripheral: PeripheralHandle) -> Self {
        Self {
            port,
            change: AttachChange::Attached {
                kind,
                peripheral,
                virtual_port: false,
            },
        }
    }

    /// Peripheral attached to a virtual port
    pub fn attached_virtual(
        port: PortId,
        kind: PeripheralKind,
        peripheral: PeripheralHandle,
    ) -> Self {
        Self {
            port,
            change: AttachChange::Attached {
                kind,
                peripheral,
                virtual_port: true,
            },
        }
    }

    pub fn detached(port: PortId) -> Self {
        Self {
            port,
            change: AttachChange::Detached,
        }
    }

    /// Attached IO event kind carried by this notification
    pub fn io_event(&self) -> IoEvent {
        match self.change {
            AttachChange::Attached {
                virtual_port: true, ..
            } => IoEvent::AttachedVirtual,
            AttachChange::Attached { .. } => IoEvent::Attached,
            AttachChange::Detached => IoEvent::Detached,
        }
    }
}

/// Sending half, owned by the connection layer
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<AttachEvent>,
}

impl EventSender {
    /// Push an event from a blocking notification thread
    pub fn send_blocking(&self, event: AttachEvent) -> crate::Result<()> {
        self.tx
            .send_blocking(event)
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Close the channel; the receiver drains what is queued and then stops
    pub fn close(&self) -> bool {
        self.tx.close()
    }
}

/// Receiving half, drained by the hub dispatcher
#[derive(Clone)]
pub struct EventReceiver {
    rx: Receiver<AttachEvent>,
}

impl EventReceiver {
    /// Wait for the next event (blocking)
    ///
    /// Fails once the channel is closed and empty.
    pub fn recv_blocking(&self) -> crate::Result<AttachEvent> {
        self.rx
            .recv_blocking()
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Wait for the next event
    pub async fn recv(&self) -> crate::Result<AttachEvent> {
        self.rx
            .recv()
            .await
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    pub fn close(&self) -> bool {
        self.rx.close()
    }
}

/// Create the attach-event channel
///
/// Returns (EventSender for the connection, EventReceiver for the hub)
pub fn create_event_bridge() -> (EventSender, EventReceiver) {
    let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
    (EventSender { tx }, EventReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mock_peripheral;

    #[tokio::test]
    async fn test_event_bridge() {
        let (tx, rx) = create_event_bridge();

        let handle = std::thread::spawn(move || {
            let p = mock_peripheral(PortId(0x00), PeripheralKind::TrainMotor);
            tx.send_blocking(AttachEvent::attached(PortId(0x00), PeripheralKind::TrainMotor, p))
                .unwrap();
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.port, PortId(0x00));
        assert_eq!(event.io_event(), IoEvent::Attached);

        handle.join().unwrap();
    }

    #[test]
    fn test_closed_bridge_drains_then_fails() {
        let (tx, rx) = create_event_bridge();
        tx.send_blocking(AttachEvent::detached(PortId(0x01))).unwrap();
        tx.close();

        let event = rx.recv_blocking().unwrap();
        assert_eq!(event.io_event(), IoEvent::Detached);
        assert!(rx.recv_blocking().is_err());
    }
}
