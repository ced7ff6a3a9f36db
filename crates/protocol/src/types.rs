//! Hub and peripheral type definitions
//!
//! This module defines the identifiers shared by every hub model: port
//! numbers, the capability tag reported with each attached peripheral, the
//! named role slots and the attach/detach event kinds.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Port identifier
///
/// Hardware-assigned number of a physical or logical connector on a hub.
/// Values are device specific; `0x00`..`0x03` are usually the external
/// ports, `0x10` the virtual combined A+B port and `0x32`.. the built-in
/// devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub u8);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Capability tag of an attached peripheral
///
/// Reported by the connection layer alongside every attached handle so the
/// resolver never has to inspect the handle itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeripheralKind {
    /// Simple motor without encoder
    Motor,
    /// Powered Up train motor
    TrainMotor,
    /// Motor with tacho feedback (internal or external)
    EncodedMotor,
    /// Single-channel LED light
    LedLight,
    /// Hub status RGB light
    RgbLight,
    /// Tilt / orientation sensor
    TiltSensor,
    /// Color and distance sensor
    VisionSensor,
    /// Current sensor
    Current,
    /// Battery voltage sensor
    Voltage,
    /// Temperature sensor
    Temperature,
    /// IO type without a dedicated capability
    Unknown(u16),
}

impl PeripheralKind {
    /// Map a LEGO wireless protocol IO type id to its capability tag
    pub fn from_type_id(type_id: u16) -> Self {
        match type_id {
            0x0001 => Self::Motor,
            0x0002 => Self::TrainMotor,
            0x0008 => Self::LedLight,
            0x0014 => Self::Voltage,
            0x0015 => Self::Current,
            0x0017 => Self::RgbLight,
            0x0022 | 0x0028 | 0x003b => Self::TiltSensor,
            0x0025 => Self::VisionSensor,
            0x0026 | 0x0027 | 0x002e | 0x002f => Self::EncodedMotor,
            0x003c => Self::Temperature,
            other => Self::Unknown(other),
        }
    }

    /// True for every variant that accepts `power()` commands
    pub fn is_motor(&self) -> bool {
        matches!(self, Self::Motor | Self::TrainMotor | Self::EncodedMotor)
    }

    /// True for the color and distance sensor
    pub fn is_vision(&self) -> bool {
        matches!(self, Self::VisionSensor)
    }

    /// True for peripherals that accept `set_brightness()`
    pub fn is_light(&self) -> bool {
        matches!(self, Self::LedLight)
    }

    /// True for sensors that stream values to subscribers
    pub fn is_sensor(&self) -> bool {
        matches!(
            self,
            Self::TiltSensor
                | Self::VisionSensor
                | Self::Current
                | Self::Voltage
                | Self::Temperature
                | Self::RgbLight
        )
    }
}

impl fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Motor => "MOTOR",
            Self::TrainMotor => "SYSTEM_TRAIN_MOTOR",
            Self::EncodedMotor => "MOTOR_WITH_TACHO",
            Self::LedLight => "LED_LIGHT",
            Self::RgbLight => "RGB_LIGHT",
            Self::TiltSensor => "TILT_SENSOR",
            Self::VisionSensor => "COLOR_DISTANCE_SENSOR",
            Self::Current => "CURRENT",
            Self::Voltage => "VOLTAGE",
            Self::Temperature => "TEMPERATURE",
            Self::Unknown(id) => return write!(f, "UNKNOWN({:#04x})", id),
        };
        f.write_str(name)
    }
}

/// Named role slot
///
/// Semantic name under which a hub exposes the peripheral attached to a
/// port. Serialized with the same names the slots are known by in the
/// product documentation (`motor_A`, `led`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "motor_A")]
    MotorA,
    #[serde(rename = "motor_B")]
    MotorB,
    #[serde(rename = "motor_AB")]
    MotorAB,
    #[serde(rename = "port_A")]
    PortA,
    #[serde(rename = "port_B")]
    PortB,
    #[serde(rename = "port_C")]
    PortC,
    #[serde(rename = "port_D")]
    PortD,
    #[serde(rename = "led")]
    Led,
    #[serde(rename = "tilt_sensor")]
    TiltSensor,
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "voltage")]
    Voltage,
    #[serde(rename = "temperature")]
    Temperature,
    /// Secondary slot: any vision sensor, whatever its port
    #[serde(rename = "vision_sensor")]
    VisionSensor,
    /// Secondary slot: a motor attached outside the primary motor ports
    #[serde(rename = "motor_external")]
    MotorExternal,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 14] = [
        Role::MotorA,
        Role::MotorB,
        Role::MotorAB,
        Role::PortA,
        Role::PortB,
        Role::PortC,
        Role::PortD,
        Role::Led,
        Role::TiltSensor,
        Role::Current,
        Role::Voltage,
        Role::Temperature,
        Role::VisionSensor,
        Role::MotorExternal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MotorA => "motor_A",
            Role::MotorB => "motor_B",
            Role::MotorAB => "motor_AB",
            Role::PortA => "port_A",
            Role::PortB => "port_B",
            Role::PortC => "port_C",
            Role::PortD => "port_D",
            Role::Led => "led",
            Role::TiltSensor => "tilt_sensor",
            Role::Current => "current",
            Role::Voltage => "voltage",
            Role::Temperature => "temperature",
            Role::VisionSensor => "vision_sensor",
            Role::MotorExternal => "motor_external",
        }
    }

    /// True for slots populated by capability rather than by port table
    pub fn is_secondary(&self) -> bool {
        matches!(self, Role::VisionSensor | Role::MotorExternal)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownRole(s.to_string()))
    }
}

/// Attached IO event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoEvent {
    Detached,
    Attached,
    /// Virtual port created by combining two physical ports
    AttachedVirtual,
}

impl IoEvent {
    pub fn is_attach(&self) -> bool {
        !matches!(self, IoEvent::Detached)
    }
}

impl TryFrom<u8> for IoEvent {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(IoEvent::Detached),
            0x01 => Ok(IoEvent::Attached),
            0x02 => Ok(IoEvent::AttachedVirtual),
            other => Err(ProtocolError::UnknownIoEvent(other)),
        }
    }
}

/// Sensor reading delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorValue {
    /// Single scalar reading (voltage, current, temperature)
    Scalar(f32),
    /// Multi-axis reading (tilt)
    Axes(Vec<i16>),
    /// Color reported by an RGB light or vision sensor
    Color(crate::color::Color),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_display() {
        assert_eq!(PortId(0x3c).to_string(), "0x3c");
        assert_eq!(PortId(0x00).to_string(), "0x00");
    }

    #[test]
    fn test_kind_from_type_id() {
        assert_eq!(PeripheralKind::from_type_id(0x0002), PeripheralKind::TrainMotor);
        assert_eq!(PeripheralKind::from_type_id(0x0025), PeripheralKind::VisionSensor);
        assert_eq!(PeripheralKind::from_type_id(0x0027), PeripheralKind::EncodedMotor);
        assert_eq!(PeripheralKind::from_type_id(0x0056), PeripheralKind::Unknown(0x56));
        assert_eq!(PeripheralKind::from_type_id(0x0005), PeripheralKind::Unknown(0x05));
    }

    #[test]
    fn test_kind_capabilities() {
        assert!(PeripheralKind::EncodedMotor.is_motor());
        assert!(PeripheralKind::TrainMotor.is_motor());
        assert!(!PeripheralKind::VisionSensor.is_motor());
        assert!(PeripheralKind::VisionSensor.is_vision());
        assert!(PeripheralKind::LedLight.is_light());
        assert!(!PeripheralKind::RgbLight.is_light());
    }

    #[test]
    fn test_role_names_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("motor_C".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_name() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            role: Role,
        }
        let text = toml::to_string(&Wrapper { role: Role::MotorAB }).unwrap();
        assert!(text.contains("\"motor_AB\""));
    }

    #[test]
    fn test_io_event_codes() {
        assert_eq!(IoEvent::try_from(0x00).unwrap(), IoEvent::Detached);
        assert!(IoEvent::try_from(0x02).unwrap().is_attach());
        assert!(IoEvent::try_from(0x07).is_err());
    }
}
