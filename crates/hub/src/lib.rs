//! Hub runtime for LEGO powered-up hubs
//!
//! Binds the peripherals a hub connection reports to named role slots
//! (`motor_A`, `led`, `voltage`, ...) using a per-model port table, waits
//! for the built-in devices after connecting, and exposes product-level
//! commands on top of the slots.
//!
//! # Example
//!
//! ```no_run
//! use hub::{DemoHub, ExpressPassengerTrain, HubModel, HubOptions, SimulatedConnection};
//! use std::time::Duration;
//!
//! # fn main() -> hub::Result<()> {
//! let mut connection = SimulatedConnection::for_model(HubModel::SmartHub, Duration::from_millis(20));
//! connection.start()?;
//!
//! let train = ExpressPassengerTrain::connect(Box::new(connection), HubOptions::default())?;
//! train.motor_forward(50)?;
//! train.motor_stop()?;
//! train.disconnect()?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod connection;
pub mod error;
pub mod hub;
pub mod products;
pub mod profile;
pub mod resolver;
pub mod sim;
pub mod slots;
pub mod waiter;

pub use cancel::CancellationToken;
pub use connection::HubConnection;
pub use error::{HubError, Result};
pub use hub::{Hub, HubOptions};
pub use products::{DemoHub, ExpressPassengerTrain, PorscheGt4, SensorSubscription};
pub use profile::{HubModel, HubProfile, PortTable, ports};
pub use resolver::{AttachmentResolver, DetachPolicy};
pub use sim::{SimCommand, SimulatedConnection, SimulatedDevices, SimulatedPeripheral};
pub use slots::{HubState, RoleSlots, SlotEntry};
pub use waiter::{ReadinessWaiter, WaitConfig, WaitOutcome};
