//! Demo routines
//!
//! Each routine drives a product through its semantic commands, pausing in
//! whole pace steps between them.

use clap::ValueEnum;
use hub::{CancellationToken, DemoHub, HubError};
use protocol::{Color, Role, SensorValue};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("demo interrupted")]
    Interrupted,

    #[error(transparent)]
    Hub(#[from] HubError),
}

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    All,
    Lights,
    Motors,
    LedColors,
    Voltage,
}

impl Demo {
    pub fn run(&self, hub: &dyn DemoHub, pacer: &Pacer) -> Result<()> {
        match self {
            Demo::All => demo_all(hub, pacer),
            Demo::Lights => demo_lights(hub, pacer),
            Demo::Motors => demo_motors(hub, pacer),
            Demo::LedColors => demo_led_colors(hub, pacer),
            Demo::Voltage => demo_voltage(hub, pacer),
        }
    }
}

/// Interruptible pause between demo steps
#[derive(Debug, Clone)]
pub struct Pacer {
    step: Duration,
    cancel: CancellationToken,
}

impl Pacer {
    pub fn new(step: Duration, cancel: CancellationToken) -> Self {
        Self { step, cancel }
    }

    /// Sleep for `steps` pace steps
    pub fn pause(&self, steps: u32) -> Result<()> {
        if self.cancel.sleep(self.step * steps) {
            Ok(())
        } else {
            Err(DemoError::Interrupted)
        }
    }
}

pub fn demo_lights(hub: &dyn DemoHub, pacer: &Pacer) -> Result<()> {
    info!("Light test.");
    hub.lights_on(100)?;
    pacer.pause(2)?;
    hub.lights_on(50)?;
    pacer.pause(2)?;
    hub.lights_off()?;
    Ok(())
}

pub fn demo_motors(hub: &dyn DemoHub, pacer: &Pacer) -> Result<()> {
    info!("Motor test. Rotate motor forward and backward, variation velocity.");
    hub.motor_forward(1)?;
    for speed in [20, 50, 100] {
        hub.motor_forward(speed)?;
        pacer.pause(2)?;
    }
    hub.motor_stop()?;
    pacer.pause(2)?;

    for speed in [20, 50, 100] {
        hub.motor_backward(speed)?;
        pacer.pause(2)?;
    }
    hub.motor_stop()?;
    Ok(())
}

pub fn demo_led_colors(hub: &dyn DemoHub, pacer: &Pacer) -> Result<()> {
    info!("LED colors demo");
    // Every palette color after black, then back to black
    let colors = Color::PALETTE[1..].iter().chain([&Color::Black]);
    for color in colors {
        info!("Setting LED color to: {}", color);
        hub.led_color(*color)?;
        pacer.pause(1)?;
    }
    Ok(())
}

pub fn demo_voltage(hub: &dyn DemoHub, pacer: &Pacer) -> Result<()> {
    let mut subscriptions = hub.subscribe_sensors(
        &[Role::Current],
        Arc::new(|value: SensorValue| info!("Amperage: {:?}", value)),
        0,
        1,
    )?;
    subscriptions.extend(hub.subscribe_sensors(
        &[Role::Voltage],
        Arc::new(|value: SensorValue| info!("Voltage: {:?}", value)),
        0,
        1,
    )?);

    let paused = pacer.pause(5);
    hub.unsubscribe_sensors(&subscriptions)?;
    paused
}

pub fn demo_all(hub: &dyn DemoHub, pacer: &Pacer) -> Result<()> {
    demo_lights(hub, pacer)?;
    demo_motors(hub, pacer)?;
    demo_led_colors(hub, pacer)?;
    demo_voltage(hub, pacer)
}
