//! Express Passenger Train (60337) on a Powered Up Smart Hub (88009)
//!
//! Port A drives the train motor, port B the head lights.

use super::{DemoHub, StatusLed, brightness, speed_fraction};
use crate::connection::HubConnection;
use crate::error::Result;
use crate::hub::{Hub, HubOptions};
use crate::profile::{HubModel, HubProfile};
use protocol::{Color, Role};
use tracing::info;

pub struct ExpressPassengerTrain {
    hub: Hub,
    led: StatusLed,
}

impl ExpressPassengerTrain {
    pub const MODEL: HubModel = HubModel::SmartHub;

    pub fn profile() -> HubProfile {
        Self::MODEL.profile()
    }

    /// Connect using the Smart Hub profile
    pub fn connect(connection: Box<dyn HubConnection>, options: HubOptions) -> Result<Self> {
        Self::connect_with(connection, Self::profile(), options)
    }

    /// Connect with a customised Smart Hub profile (e.g. another hub name)
    pub fn connect_with(
        connection: Box<dyn HubConnection>,
        profile: HubProfile,
        options: HubOptions,
    ) -> Result<Self> {
        let hub = Hub::connect(connection, profile, options)?;
        Ok(Self {
            hub,
            led: StatusLed::default(),
        })
    }

    pub fn light_on(&self, percent: i32) -> Result<()> {
        info!("ExpressPassengerTrain: Lights on. Percentage: {}%", percent);
        let percent = brightness(percent)?;
        self.hub.require(Role::PortB)?.set_brightness(percent)?;
        Ok(())
    }

    pub fn light_off(&self) -> Result<()> {
        info!("ExpressPassengerTrain: Lights off");
        self.hub.require(Role::PortB)?.set_brightness(0)?;
        Ok(())
    }

    pub fn disconnect(self) -> Result<()> {
        let released = self.led.release();
        self.hub.disconnect().and(released)
    }
}

impl DemoHub for ExpressPassengerTrain {
    fn product(&self) -> &'static str {
        "ExpressPassengerTrain"
    }

    fn hub(&self) -> &Hub {
        &self.hub
    }

    fn lights_on(&self, percent: i32) -> Result<()> {
        self.light_on(percent)
    }

    fn lights_off(&self) -> Result<()> {
        self.light_off()
    }

    fn motor_forward(&self, percent: i32) -> Result<()> {
        info!("ExpressPassengerTrain: Motor forward. Percentage: {}%", percent);
        let fraction = speed_fraction(percent)?;
        self.hub.require(Role::PortA)?.power(fraction)?;
        Ok(())
    }

    fn motor_backward(&self, percent: i32) -> Result<()> {
        info!("ExpressPassengerTrain: Motor backward. Percentage: {}%", percent);
        let fraction = speed_fraction(percent)?;
        self.hub.require(Role::PortA)?.power(-fraction)?;
        Ok(())
    }

    fn motor_stop(&self) -> Result<()> {
        info!("ExpressPassengerTrain: Motor stop");
        self.hub.require(Role::PortA)?.stop()?;
        Ok(())
    }

    fn led_color(&self, color: Color) -> Result<()> {
        info!("ExpressPassengerTrain: LED color {}", color);
        self.led.set(&self.hub, color)
    }

    fn disconnect_boxed(self: Box<Self>) -> Result<()> {
        (*self).disconnect()
    }
}
