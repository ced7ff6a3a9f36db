//! Porsche GT4 e-Performance Race Car (42176) on a Technic Move Hub
//!
//! Port A drives, port B steers, ports C and D carry the front and back
//! lights.

use super::{DemoHub, StatusLed, brightness, speed_fraction};
use crate::connection::HubConnection;
use crate::error::Result;
use crate::hub::{Hub, HubOptions};
use crate::profile::{HubModel, HubProfile};
use protocol::{Color, Role};
use tracing::info;

const DRIVE: Role = Role::PortA;
const STEERING: Role = Role::PortB;
const FRONT_LIGHTS: Role = Role::PortC;
const BACK_LIGHTS: Role = Role::PortD;

pub struct PorscheGt4 {
    hub: Hub,
    led: StatusLed,
}

impl PorscheGt4 {
    pub const MODEL: HubModel = HubModel::TechnicMoveHub;

    pub fn profile() -> HubProfile {
        Self::MODEL.profile()
    }

    pub fn connect(connection: Box<dyn HubConnection>, options: HubOptions) -> Result<Self> {
        Self::connect_with(connection, Self::profile(), options)
    }

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

    pub fn lights_front_on(&self, percent: i32) -> Result<()> {
        info!("PorscheGT4: Lights front on. Percentage: {}%", percent);
        let percent = brightness(percent)?;
        self.hub.require(FRONT_LIGHTS)?.set_brightness(percent)?;
        Ok(())
    }

    pub fn lights_front_off(&self) -> Result<()> {
        info!("PorscheGT4: Lights front off");
        self.hub.require(FRONT_LIGHTS)?.set_brightness(0)?;
        Ok(())
    }

    pub fn lights_back_on(&self, percent: i32) -> Result<()> {
        info!("PorscheGT4: Lights back on. Percentage: {}%", percent);
        let percent = brightness(percent)?;
        self.hub.require(BACK_LIGHTS)?.set_brightness(percent)?;
        Ok(())
    }

    pub fn lights_back_off(&self) -> Result<()> {
        info!("PorscheGT4: Lights back off");
        self.hub.require(BACK_LIGHTS)?.set_brightness(0)?;
        Ok(())
    }

    pub fn steer_right(&self, percent: i32) -> Result<()> {
        info!("PorscheGT4: Steer right. Percentage: {}%", percent);
        let fraction = speed_fraction(percent)?;
        self.hub.require(STEERING)?.power(fraction)?;
        Ok(())
    }

    pub fn steer_left(&self, percent: i32) -> Result<()> {
        info!("PorscheGT4: Steer left. Percentage: {}%", percent);
        let fraction = speed_fraction(percent)?;
        self.hub.require(STEERING)?.power(-fraction)?;
        Ok(())
    }

    pub fn steer_center(&self) -> Result<()> {
        info!("PorscheGT4: Steer center");
        self.hub.require(STEERING)?.stop()?;
        Ok(())
    }

    pub fn disconnect(self) -> Result<()> {
        let released = self.led.release();
        self.hub.disconnect().and(released)
    }
}

impl DemoHub for PorscheGt4 {
    fn product(&self) -> &'static str {
        "PorscheGT4"
    }

    fn hub(&self) -> &Hub {
        &self.hub
    }

    fn lights_on(&self, percent: i32) -> Result<()> {
        info!("PorscheGT4: Lights on. Percentage: {}%", percent);
        self.lights_front_on(percent)?;
        self.lights_back_on(percent)
    }

    fn lights_off(&self) -> Result<()> {
        info!("PorscheGT4: Lights off");
        self.lights_back_off()?;
        self.lights_front_off()
    }

    fn motor_forward(&self, percent: i32) -> Result<()> {
        info!("PorscheGT4: Motor forward. Percentage: {}%", percent);
        let fraction = speed_fraction(percent)?;
        self.hub.require(DRIVE)?.power(fraction)?;
        Ok(())
    }

    fn motor_backward(&self, percent: i32) -> Result<()> {
        info!("PorscheGT4: Motor backward. Percentage: {}%", percent);
        let fraction = speed_fraction(percent)?;
        self.hub.require(DRIVE)?.power(-fraction)?;
        Ok(())
    }

    fn motor_stop(&self) -> Result<()> {
        info!("PorscheGT4: Motor stop");
        self.hub.require(DRIVE)?.stop()?;
        Ok(())
    }

    fn led_color(&self, color: Color) -> Result<()> {
        info!("PorscheGT4: LED color {}", color);
        self.led.set(&self.hub, color)
    }

    fn disconnect_boxed(self: Box<Self>) -> Result<()> {
        (*self).disconnect()
    }
}
