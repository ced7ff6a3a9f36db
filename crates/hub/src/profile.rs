//! Hub models and their port tables
//!
//! Each hub model is described by data: a port→role table, the set of roles
//! that must be present before the hub is considered ready, and the ports
//! reserved for the primary motors. The profile is chosen when the hub is
//! constructed.

use crate::error::{HubError, Result};
use protocol::{PortId, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Port numbers shared by the hub models
pub mod ports {
    use protocol::PortId;

    pub const A: PortId = PortId(0x00);
    pub const B: PortId = PortId(0x01);
    pub const C: PortId = PortId(0x02);
    pub const D: PortId = PortId(0x03);
    pub const AB: PortId = PortId(0x10);
    pub const LED: PortId = PortId(0x32);
    pub const TEMPERATURE: PortId = PortId(0x37);
    pub const TILT_SENSOR: PortId = PortId(0x3a);
    pub const CURRENT: PortId = PortId(0x3b);
    pub const VOLTAGE: PortId = PortId(0x3c);
    pub const TECHNIC_LED: PortId = PortId(0x3f);
}

/// Supported hub hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HubModel {
    /// LEGO Boost Move Hub (88006)
    MoveHub,
    /// Powered Up Smart Hub (88009)
    SmartHub,
    /// Technic Move Hub shipped with the Porsche GT4 (42176)
    TechnicMoveHub,
}

impl HubModel {
    pub const ALL: [HubModel; 3] = [
        HubModel::MoveHub,
        HubModel::SmartHub,
        HubModel::TechnicMoveHub,
    ];

    /// Name the hub advertises over Bluetooth
    pub fn default_name(&self) -> &'static str {
        match self {
            HubModel::MoveHub => "LEGO Move Hub",
            HubModel::SmartHub => "HUB NO.4",
            HubModel::TechnicMoveHub => "Technic Move  ",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HubModel::MoveHub => "move-hub",
            HubModel::SmartHub => "smart-hub",
            HubModel::TechnicMoveHub => "technic-move-hub",
        }
    }

    fn entries(&self) -> &'static [(PortId, Role)] {
        match self {
            HubModel::MoveHub => &[
                (ports::A, Role::MotorA),
                (ports::B, Role::MotorB),
                (ports::C, Role::PortC),
                (ports::D, Role::PortD),
                (ports::AB, Role::MotorAB),
                (ports::LED, Role::Led),
                (ports::TILT_SENSOR, Role::TiltSensor),
                (ports::CURRENT, Role::Current),
                (ports::VOLTAGE, Role::Voltage),
            ],
            HubModel::SmartHub => &[
                (ports::A, Role::PortA),
                (ports::B, Role::PortB),
                (ports::LED, Role::Led),
                (ports::CURRENT, Role::Current),
                (ports::VOLTAGE, Role::Voltage),
            ],
            HubModel::TechnicMoveHub => &[
                (ports::A, Role::PortA),
                (ports::B, Role::PortB),
                (ports::C, Role::PortC),
                (ports::D, Role::PortD),
                (ports::TEMPERATURE, Role::Temperature),
                (ports::TILT_SENSOR, Role::TiltSensor),
                (ports::VOLTAGE, Role::Voltage),
                (ports::TECHNIC_LED, Role::Led),
            ],
        }
    }

    /// Roles that are built into the hub and always appear after connect
    fn ready_set(&self) -> &'static [Role] {
        match self {
            HubModel::MoveHub => &[
                Role::MotorA,
                Role::MotorB,
                Role::MotorAB,
                Role::Led,
                Role::TiltSensor,
                Role::Current,
                Role::Voltage,
            ],
            HubModel::SmartHub => &[Role::Led, Role::Current, Role::Voltage],
            HubModel::TechnicMoveHub => &[Role::Led, Role::TiltSensor, Role::Voltage],
        }
    }

    fn primary_motor_ports(&self) -> &'static [PortId] {
        match self {
            HubModel::MoveHub => &[ports::A, ports::B, ports::AB],
            HubModel::SmartHub => &[ports::A, ports::B],
            HubModel::TechnicMoveHub => &[ports::A, ports::B],
        }
    }

    /// Build the profile for this model
    pub fn profile(&self) -> HubProfile {
        let table = PortTable::new(self.entries().iter().copied())
            .unwrap_or_else(|e| unreachable!("built-in port table is invalid: {e}"));

        HubProfile {
            model: *self,
            name: self.default_name().to_string(),
            table,
            ready_set: self.ready_set().to_vec(),
            primary_motor_ports: self.primary_motor_ports().to_vec(),
        }
    }
}

impl fmt::Display for HubModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HubModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HubModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown hub model '{}', expected one of: move-hub, smart-hub, technic-move-hub",
                    s
                )
            })
    }
}

/// Static port→role mapping of one hub model
///
/// Entries are disjoint: a port appears at most once and a role is bound to
/// at most one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortTable {
    entries: Vec<(PortId, Role)>,
}

impl PortTable {
    /// Build a table, rejecting duplicate ports, duplicate roles and
    /// secondary roles
    pub fn new(entries: impl IntoIterator<Item = (PortId, Role)>) -> Result<Self> {
        let mut seen_ports = HashSet::new();
        let mut seen_roles = HashSet::new();
        let mut table = Vec::new();

        for (port, role) in entries {
            if role.is_secondary() {
                return Err(HubError::SecondaryRole(role));
            }
            if !seen_ports.insert(port) {
                return Err(HubError::DuplicatePort(port));
            }
            if !seen_roles.insert(role) {
                return Err(HubError::DuplicateRole(role));
            }
            table.push((port, role));
        }

        Ok(Self { entries: table })
    }

    /// Role bound to `port`, if any
    pub fn role_for(&self, port: PortId) -> Option<Role> {
        self.entries
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, role)| *role)
    }

    /// Port bound to `role`, if any
    pub fn port_for(&self, role: Role) -> Option<PortId> {
        self.entries
            .iter()
            .find(|(_, r)| *r == role)
            .map(|(port, _)| *port)
    }

    pub fn entries(&self) -> &[(PortId, Role)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the hub runtime needs to know about a model
#[derive(Debug, Clone)]
pub struct HubProfile {
    pub model: HubModel,
    /// Advertised name used to find the hub
    pub name: String,
    pub table: PortTable,
    /// Roles waited for after connecting
    pub ready_set: Vec<Role>,
    /// Ports whose motors never count as `motor_external`
    pub primary_motor_ports: Vec<PortId>,
}

impl HubProfile {
    /// Override the advertised name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the roles waited for after connecting
    pub fn with_ready_set(mut self, roles: impl Into<Vec<Role>>) -> Self {
        self.ready_set = roles.into();
        self
    }

    pub fn is_primary_motor_port(&self, port: PortId) -> bool {
        self.primary_motor_ports.contains(&port)
    }
}
