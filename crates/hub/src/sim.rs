//! Simulated hub connection
//!
//! Stands in for a Bluetooth connection: attaches a fixed list of
//! peripherals from its own thread, with a jittered delay between attaches,
//! and records every command the peripherals receive.

use crate::cancel::CancellationToken;
use crate::connection::HubConnection;
use crate::profile::{HubModel, ports};
use common::peripheral::{check_brightness, check_power};
use common::{
    AttachEvent, EventReceiver, EventSender, Peripheral, PeripheralHandle, SensorCallback,
    SubscriptionId, create_event_bridge,
};
use protocol::{Color, PeripheralKind, PortId, SensorValue};
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

/// Command received by a simulated peripheral
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    Power(f32),
    Stop,
    Brightness(u8),
    Color(Color),
    Subscribe { mode: u8, granularity: u32 },
    Unsubscribe(SubscriptionId),
}

#[derive(Default)]
struct SimState {
    commands: Vec<SimCommand>,
    subscribers: HashMap<SubscriptionId, SensorCallback>,
}

/// Peripheral that records commands instead of sending them
pub struct SimulatedPeripheral {
    port: PortId,
    kind: PeripheralKind,
    state: Mutex<SimState>,
    next_subscription: AtomicU64,
}

impl SimulatedPeripheral {
    pub fn new(port: PortId, kind: PeripheralKind) -> Self {
        Self {
            port,
            kind,
            state: Mutex::new(SimState::default()),
            next_subscription: AtomicU64::new(1),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Every command received so far, oldest first
    pub fn commands(&self) -> Vec<SimCommand> {
        self.state().commands.clone()
    }

    pub fn last_command(&self) -> Option<SimCommand> {
        self.state().commands.last().cloned()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }

    /// Deliver a reading to every subscriber
    pub fn emit(&self, value: SensorValue) {
        let callbacks: Vec<SensorCallback> = self.state().subscribers.values().cloned().collect();
        for callback in callbacks {
            callback(value.clone());
        }
    }

    fn record(&self, command: SimCommand) {
        debug!("{} on port {}: {:?}", self.kind, self.port, command);
        self.state().commands.push(command);
    }

    /// Reading reported right after subscribing
    fn sample(&self) -> Option<SensorValue> {
        match self.kind {
            PeripheralKind::Voltage => Some(SensorValue::Scalar(8.3)),
            PeripheralKind::Current => Some(SensorValue::Scalar(0.12)),
            PeripheralKind::Temperature => Some(SensorValue::Scalar(24.5)),
            PeripheralKind::TiltSensor => Some(SensorValue::Axes(vec![0, 0, 90])),
            PeripheralKind::VisionSensor => Some(SensorValue::Color(Color::None)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for SimulatedPeripheral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedPeripheral")
            .field("port", &self.port)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Peripheral for SimulatedPeripheral {
    fn port(&self) -> PortId {
        self.port
    }

    fn kind(&self) -> PeripheralKind {
        self.kind
    }

    fn power(&self, fraction: f32) -> common::Result<()> {
        if !self.kind.is_motor() {
            return Err(self.unsupported("power"));
        }
        self.record(SimCommand::Power(check_power(fraction)?));
        Ok(())
    }

    fn stop(&self) -> common::Result<()> {
        if !self.kind.is_motor() {
            return Err(self.unsupported("stop"));
        }
        self.record(SimCommand::Stop);
        Ok(())
    }

    fn set_color(&self, color: Color) -> common::Result<()> {
        if self.kind != PeripheralKind::RgbLight {
            return Err(self.unsupported("set_color"));
        }
        self.record(SimCommand::Color(color));
        self.emit(SensorValue::Color(color));
        Ok(())
    }

    fn set_brightness(&self, percent: u8) -> common::Result<()> {
        if !self.kind.is_light() {
            return Err(self.unsupported("set_brightness"));
        }
        self.record(SimCommand::Brightness(check_brightness(percent)?));
        Ok(())
    }

    fn subscribe(
        &self,
        callback: SensorCallback,
        mode: u8,
        granularity: u32,
    ) -> common::Result<SubscriptionId> {
        if !self.kind.is_sensor() {
            return Err(self.unsupported("subscribe"));
        }
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.record(SimCommand::Subscribe { mode, granularity });
        self.state().subscribers.insert(id, callback.clone());

        if let Some(value) = self.sample() {
            callback(value);
        }
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> common::Result<()> {
        if self.state().subscribers.remove(&id).is_none() {
            return Err(common::Error::Peripheral(format!(
                "no subscription {:?} on port {}",
                id, self.port
            )));
        }
        self.record(SimCommand::Unsubscribe(id));
        Ok(())
    }
}

/// Shared view of the peripherals a simulated connection created
///
/// Also lets tests hot-plug devices after the hub is connected.
#[derive(Clone)]
pub struct SimulatedDevices {
    registry: Arc<Mutex<HashMap<PortId, Arc<SimulatedPeripheral>>>>,
    sender: EventSender,
}

impl SimulatedDevices {
    fn registry(&self) -> MutexGuard<'_, HashMap<PortId, Arc<SimulatedPeripheral>>> {
        self.registry.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Peripheral currently attached to `port`
    pub fn get(&self, port: PortId) -> Option<Arc<SimulatedPeripheral>> {
        self.registry().get(&port).cloned()
    }

    /// Attach a new peripheral and notify the hub
    pub fn attach(
        &self,
        port: PortId,
        kind: PeripheralKind,
    ) -> common::Result<Arc<SimulatedPeripheral>> {
        let peripheral = Arc::new(SimulatedPeripheral::new(port, kind));
        self.registry().insert(port, peripheral.clone());

        let handle: PeripheralHandle = peripheral.clone();
        let event = if port == ports::AB {
            AttachEvent::attached_virtual(port, kind, handle)
        } else {
            AttachEvent::attached(port, kind, handle)
        };
        self.sender.send_blocking(event)?;
        Ok(peripheral)
    }

    /// Remove the peripheral on `port` and notify the hub
    pub fn detach(&self, port: PortId) -> common::Result<()> {
        self.registry().remove(&port);
        self.sender.send_blocking(AttachEvent::detached(port))
    }
}

/// In-process replacement for a hub connection
pub struct SimulatedConnection {
    name: String,
    devices: Vec<(PortId, PeripheralKind)>,
    attach_delay: Duration,
    shared: SimulatedDevices,
    events: Option<EventReceiver>,
    stop: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedConnection {
    pub fn new(
        name: impl Into<String>,
        devices: Vec<(PortId, PeripheralKind)>,
        attach_delay: Duration,
    ) -> Self {
        let (sender, receiver) = create_event_bridge();
        Self {
            name: name.into(),
            devices,
            attach_delay,
            shared: SimulatedDevices {
                registry: Arc::new(Mutex::new(HashMap::new())),
                sender,
            },
            events: Some(receiver),
            stop: CancellationToken::new(),
            worker: None,
        }
    }

    /// Connection that attaches the devices a `model` hub reports
    pub fn for_model(model: HubModel, attach_delay: Duration) -> Self {
        Self::new(
            format!("sim://{}", model),
            default_devices(model),
            attach_delay,
        )
    }

    /// Handle for inspecting and hot-plugging peripherals
    pub fn devices(&self) -> SimulatedDevices {
        self.shared.clone()
    }

    /// Start attaching the configured peripherals from a background thread
    pub fn start(&mut self) -> std::io::Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        let devices = self.devices.clone();
        let shared = self.shared.clone();
        let stop = self.stop.clone();
        let delay = self.attach_delay;

        let worker = std::thread::Builder::new()
            .name("sim-connection".to_string())
            .spawn(move || {
                let mut rng = rand::rng();
                for (port, kind) in devices {
                    let jitter: f64 = rng.random_range(0.5..1.5);
                    if !stop.sleep(delay.mul_f64(jitter)) {
                        debug!("Simulated attach sequence stopped");
                        return;
                    }
                    if let Err(e) = shared.attach(port, kind) {
                        error!("Failed to deliver simulated attach on port {}: {}", port, e);
                        return;
                    }
                }
                debug!("Simulated attach sequence complete");
            })?;

        info!("Simulated connection {} started", self.name);
        self.worker = Some(worker);
        Ok(())
    }
}

impl HubConnection for SimulatedConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn take_events(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }

    fn disconnect(&mut self) -> common::Result<()> {
        self.stop.cancel();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            return Err(common::Error::Other(
                "simulated connection thread panicked".to_string(),
            ));
        }
        self.shared.sender.close();
        info!("Simulated connection {} closed", self.name);
        Ok(())
    }
}

impl Drop for SimulatedConnection {
    fn drop(&mut self) {
        self.stop.cancel();
        self.shared.sender.close();
    }
}

/// Peripherals each hub model reports right after connecting
pub fn default_devices(model: HubModel) -> Vec<(PortId, PeripheralKind)> {
    match model {
        HubModel::MoveHub => vec![
            (ports::A, PeripheralKind::EncodedMotor),
            (ports::B, PeripheralKind::EncodedMotor),
            (ports::AB, PeripheralKind::EncodedMotor),
            (ports::C, PeripheralKind::VisionSensor),
            (ports::D, PeripheralKind::EncodedMotor),
            (ports::LED, PeripheralKind::RgbLight),
            (ports::TILT_SENSOR, PeripheralKind::TiltSensor),
            (ports::CURRENT, PeripheralKind::Current),
            (ports::VOLTAGE, PeripheralKind::Voltage),
        ],
        HubModel::SmartHub => vec![
            (ports::A, PeripheralKind::TrainMotor),
            (ports::B, PeripheralKind::LedLight),
            (ports::LED, PeripheralKind::RgbLight),
            (ports::CURRENT, PeripheralKind::Current),
            (ports::VOLTAGE, PeripheralKind::Voltage),
        ],
        HubModel::TechnicMoveHub => vec![
            (ports::A, PeripheralKind::EncodedMotor),
            (ports::B, PeripheralKind::EncodedMotor),
            (ports::C, PeripheralKind::LedLight),
            (ports::D, PeripheralKind::LedLight),
            (PortId(0x32), PeripheralKind::Unknown(0x56)),
            (PortId(0x36), PeripheralKind::Unknown(0x59)),
            (ports::TEMPERATURE, PeripheralKind::Temperature),
            (PortId(0x38), PeripheralKind::Unknown(0x39)),
            (ports::TILT_SENSOR, PeripheralKind::TiltSensor),
            (ports::VOLTAGE, PeripheralKind::Voltage),
            (ports::TECHNIC_LED, PeripheralKind::RgbLight),
        ],
    }
}
