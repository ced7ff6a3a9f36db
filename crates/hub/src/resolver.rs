//! Attachment resolver
//!
//! Translates attach/detach notifications into role slot assignments using
//! the hub profile's port table. One event is handled entirely inside one
//! critical section on the hub state, so concurrent events never leave a
//! slot half-updated.

use crate::profile::HubProfile;
use crate::slots::{HubState, SlotEntry};
use common::{AttachChange, AttachEvent, PeripheralHandle};
use protocol::{PeripheralKind, PortId, Role};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// What a detach event does to the role slots bound to its port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetachPolicy {
    /// Clear every slot bound to the detached port
    #[default]
    Clear,
    /// Keep slots populated for the lifetime of the hub
    Sticky,
}

/// Applies attach events to the shared hub state
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    profile: Arc<HubProfile>,
    state: Arc<Mutex<HubState>>,
    detach_policy: DetachPolicy,
}

impl AttachmentResolver {
    pub fn new(
        profile: Arc<HubProfile>,
        state: Arc<Mutex<HubState>>,
        detach_policy: DetachPolicy,
    ) -> Self {
        Self {
            profile,
            state,
            detach_policy,
        }
    }

    /// Handle one attach or detach notification
    ///
    /// Never fails: unmapped ports only reach the generic registry.
    pub fn handle_event(&self, event: AttachEvent) {
        let mut state = lock_state(&self.state);

        register_peripheral(&mut state, &event);

        match event.change {
            AttachChange::Attached {
                kind, peripheral, ..
            } => self.resolve_attached(&mut state, event.port, kind, peripheral),
            AttachChange::Detached => self.resolve_detached(&mut state, event.port),
        }
    }

    fn resolve_attached(
        &self,
        state: &mut HubState,
        port: PortId,
        kind: PeripheralKind,
        peripheral: PeripheralHandle,
    ) {
        let entry = SlotEntry {
            port,
            kind,
            peripheral,
        };

        match self.profile.table.role_for(port) {
            Some(role) => {
                debug!("Port {} -> {}", port, role);
                state.slots.set(role, entry.clone());
            }
            None => {
                debug!("Port {} has no role on {}", port, self.profile.model);
            }
        }

        if kind.is_vision() {
            debug!("Port {} -> {}", port, Role::VisionSensor);
            state.slots.set(Role::VisionSensor, entry);
        } else if kind.is_motor() && !self.profile.is_primary_motor_port(port) {
            debug!("Port {} -> {}", port, Role::MotorExternal);
            state.slots.set(Role::MotorExternal, entry);
        }
    }

    fn resolve_detached(&self, state: &mut HubState, port: PortId) {
        match self.detach_policy {
            DetachPolicy::Clear => {
                let cleared = state.slots.clear_port(port);
                if !cleared.is_empty() {
                    info!(
                        "Detached port {}, cleared roles: {}",
                        port,
                        format_roles(&cleared)
                    );
                }
            }
            DetachPolicy::Sticky => {
                debug!("Detached port {}, role slots kept", port);
            }
        }
    }
}

/// Generic registry update applied to every event, mapped or not
fn register_peripheral(state: &mut HubState, event: &AttachEvent) {
    match &event.change {
        AttachChange::Attached {
            kind, peripheral, ..
        } => {
            if let PeripheralKind::Unknown(type_id) = kind {
                warn!(
                    "Have no dedicated class for peripheral type {:#04x} on port {}",
                    type_id, event.port
                );
            }
            info!("Attached peripheral {} on port {}", kind, event.port);
            state
                .peripherals
                .insert(event.port, (*kind, peripheral.clone()));
        }
        AttachChange::Detached => {
            if let Some((kind, _)) = state.peripherals.remove(&event.port) {
                info!("Detached peripheral {} on port {}", kind, event.port);
            } else {
                debug!("Detach for empty port {}", event.port);
            }
        }
    }
}

/// Lock the hub state, recovering from a poisoned mutex
///
/// Slot writes are single map operations, so state behind a poisoned lock
/// is still consistent.
pub(crate) fn lock_state(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
