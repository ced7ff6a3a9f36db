//! Common utilities for lego-hub-rs
//!
//! This crate provides shared functionality between the hub runtime and the
//! demo binary: the opaque peripheral capability interface, the attach-event
//! channel, error handling and logging setup.

pub mod channel;
pub mod error;
pub mod logging;
pub mod peripheral;
pub mod test_utils;

pub use channel::{AttachChange, AttachEvent, EventReceiver, EventSender, create_event_bridge};
pub use error::{Error, Result};
pub use logging::setup_logging;
pub use peripheral::{Peripheral, PeripheralHandle, SensorCallback, SubscriptionId};
