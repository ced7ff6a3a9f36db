//! Product wrappers
//!
//! Each LEGO set exposes semantic commands (drive, lights, status LED) that
//! forward to the role slots of the hub it ships with.

pub mod porsche;
pub mod train;

pub use porsche::PorscheGt4;
pub use train::ExpressPassengerTrain;

use crate::error::{Result, check_range};
use crate::hub::Hub;
use common::{PeripheralHandle, SensorCallback, SubscriptionId};
use protocol::{Color, Role, SensorValue};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Sensor subscription made through [`DemoHub::subscribe_sensors`]
///
/// Holds the peripheral it was made on, so it can be cancelled after the
/// role slot has been cleared or rebound.
#[derive(Debug, Clone)]
pub struct SensorSubscription {
    pub role: Role,
    pub peripheral: PeripheralHandle,
    pub id: SubscriptionId,
}

/// Commands every demo-capable product supports
pub trait DemoHub: Send {
    /// Product name used in logs
    fn product(&self) -> &'static str;

    fn hub(&self) -> &Hub;

    fn lights_on(&self, percent: i32) -> Result<()>;

    fn lights_off(&self) -> Result<()>;

    fn motor_forward(&self, percent: i32) -> Result<()>;

    fn motor_backward(&self, percent: i32) -> Result<()>;

    fn motor_stop(&self) -> Result<()>;

    /// Set the hub status LED
    fn led_color(&self, color: Color) -> Result<()>;

    /// Close the connection of a boxed product
    fn disconnect_boxed(self: Box<Self>) -> Result<()>;

    /// Subscribe `callback` to every populated role in `roles`
    ///
    /// Roles that are not populated are skipped.
    fn subscribe_sensors(
        &self,
        roles: &[Role],
        callback: SensorCallback,
        mode: u8,
        granularity: u32,
    ) -> Result<Vec<SensorSubscription>> {
        let mut subscriptions = Vec::new();
        for role in roles {
            if let Some(sensor) = self.hub().peripheral(*role) {
                let id = sensor.subscribe(callback.clone(), mode, granularity)?;
                subscriptions.push(SensorSubscription {
                    role: *role,
                    peripheral: sensor,
                    id,
                });
            }
        }
        Ok(subscriptions)
    }

    /// Cancel every subscription in `subscriptions`
    ///
    /// A failing entry does not stop the others; the first error is
    /// returned once all of them have been tried.
    fn unsubscribe_sensors(&self, subscriptions: &[SensorSubscription]) -> Result<()> {
        let mut first_error = None;
        for subscription in subscriptions {
            if let Err(e) = subscription.peripheral.unsubscribe(subscription.id) {
                warn!("Failed to unsubscribe from {}: {}", subscription.role, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Map a speed percentage in `[-100, 100]` to a power fraction
pub fn speed_fraction(percent: i32) -> Result<f32> {
    let percent = check_range("speed", percent, -100, 100)?;
    Ok(percent as f32 / 100.0)
}

/// Validate a brightness percentage in `[0, 100]`
pub fn brightness(percent: i32) -> Result<u8> {
    let percent = check_range("brightness", percent, 0, 100)?;
    Ok(percent as u8)
}

/// Status LED with a logging color subscription
///
/// The subscription is made on first use and remade whenever the LED role
/// is bound to a different peripheral.
#[derive(Debug, Default)]
pub struct StatusLed {
    subscription: Mutex<Option<(PeripheralHandle, SubscriptionId)>>,
}

impl StatusLed {
    pub fn set(&self, hub: &Hub, color: Color) -> Result<()> {
        let led = hub.require(Role::Led)?;

        let mut subscription = self.subscription.lock().unwrap_or_else(|p| p.into_inner());
        let current = matches!(&*subscription, Some((handle, _)) if Arc::ptr_eq(handle, &led));
        if !current {
            if let Some((stale, id)) = subscription.take()
                && let Err(e) = stale.unsubscribe(id)
            {
                debug!("Dropping LED subscription on port {}: {}", stale.port(), e);
            }
            let id = led.subscribe(
                Arc::new(|value: SensorValue| info!("LED color callback: {:?}", value)),
                0,
                1,
            )?;
            *subscription = Some((led.clone(), id));
        }
        drop(subscription);

        led.set_color(color)?;
        Ok(())
    }

    /// Cancel the color subscription, if one was made
    pub fn release(&self) -> Result<()> {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some((led, id)) = subscription {
            led.unsubscribe(id)?;
        }
        Ok(())
    }
}
