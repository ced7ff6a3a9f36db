//! Role slots and the peripheral registry
//!
//! `HubState` is the only mutable state shared between the event dispatcher
//! and application code. It is always accessed through the hub's mutex.

use common::PeripheralHandle;
use protocol::{PeripheralKind, PortId, Role};
use std::collections::{BTreeMap, HashMap};

/// A populated role slot
#[derive(Debug, Clone)]
pub struct SlotEntry {
    /// Port the bound peripheral is attached to
    pub port: PortId,
    pub kind: PeripheralKind,
    pub peripheral: PeripheralHandle,
}

/// Named role slots, empty until the resolver binds them
#[derive(Debug, Default, Clone)]
pub struct RoleSlots {
    slots: BTreeMap<Role, SlotEntry>,
}

impl RoleSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: Role) -> Option<&SlotEntry> {
        self.slots.get(&role)
    }

    pub fn peripheral(&self, role: Role) -> Option<PeripheralHandle> {
        self.slots.get(&role).map(|entry| entry.peripheral.clone())
    }

    pub fn is_populated(&self, role: Role) -> bool {
        self.slots.contains_key(&role)
    }

    /// Bind `role`, returning the previous entry
    pub fn set(&mut self, role: Role, entry: SlotEntry) -> Option<SlotEntry> {
        self.slots.insert(role, entry)
    }

    pub fn clear(&mut self, role: Role) -> Option<SlotEntry> {
        self.slots.remove(&role)
    }

    /// Clear every slot bound to `port`, returning the cleared roles
    pub fn clear_port(&mut self, port: PortId) -> Vec<Role> {
        let roles: Vec<Role> = self
            .slots
            .iter()
            .filter(|(_, entry)| entry.port == port)
            .map(|(role, _)| *role)
            .collect();
        for role in &roles {
            self.slots.remove(role);
        }
        roles
    }

    pub fn clear_all(&mut self) {
        self.slots.clear();
    }

    /// Populated roles in role order
    pub fn roles(&self) -> Vec<Role> {
        self.slots.keys().copied().collect()
    }

    /// Presence of each role in `roles`
    pub fn presence(&self, roles: &[Role]) -> Vec<(Role, bool)> {
        roles
            .iter()
            .map(|role| (*role, self.is_populated(*role)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Peripheral registry plus role slots, guarded together
#[derive(Debug, Default)]
pub struct HubState {
    /// Every attached peripheral by port, mapped or not
    pub peripherals: HashMap<PortId, (PeripheralKind, PeripheralHandle)>,
    pub slots: RoleSlots,
}

impl HubState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle currently attached to `port`
    pub fn peripheral_at(&self, port: PortId) -> Option<&PeripheralHandle> {
        self.peripherals.get(&port).map(|(_, handle)| handle)
    }
}
