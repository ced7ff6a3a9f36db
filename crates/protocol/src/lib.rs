//! Protocol library for lego-hub-rs
//!
//! This crate defines the identifiers exchanged between a hub connection and
//! the hub runtime: port numbers, peripheral capability tags, role slot names,
//! attach event kinds and the LED color palette. It carries no transport or
//! framing logic.
//!
//! # Example
//!
//! ```
//! use protocol::{Color, PeripheralKind, PortId, Role};
//!
//! let kind = PeripheralKind::from_type_id(0x0002);
//! assert!(kind.is_motor());
//!
//! let role: Role = "motor_external".parse().unwrap();
//! assert!(role.is_secondary());
//!
//! assert_eq!(PortId(0x32).to_string(), "0x32");
//! assert_eq!("purple".parse::<Color>().unwrap(), Color::Purple);
//! ```

pub mod color;
pub mod error;
pub mod types;

pub use color::Color;
pub use error::{ProtocolError, Result};
pub use types::{IoEvent, PeripheralKind, PortId, Role, SensorValue};
