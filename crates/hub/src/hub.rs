//! Hub runtime
//!
//! Owns the role slots of one connected hub, runs the dispatcher thread that
//! feeds attach events to the resolver, and waits for the built-in devices
//! after connecting.

use crate::cancel::CancellationToken;
use crate::connection::HubConnection;
use crate::error::{HubError, Result};
use crate::profile::HubProfile;
use crate::resolver::{AttachmentResolver, DetachPolicy, format_roles, lock_state};
use crate::slots::HubState;
use crate::waiter::{ReadinessWaiter, WaitConfig, WaitOutcome};
use common::{EventReceiver, PeripheralHandle};
use protocol::{PeripheralKind, PortId, Role};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// Runtime options for a hub
#[derive(Debug, Clone, Default)]
pub struct HubOptions {
    pub wait: WaitConfig,
    pub detach_policy: DetachPolicy,
    /// Cancels the readiness wait
    pub cancel: CancellationToken,
}

/// A connected hub with its role slots
pub struct Hub {
    profile: Arc<HubProfile>,
    state: Arc<Mutex<HubState>>,
    waiter: ReadinessWaiter,
    connection: Option<Box<dyn HubConnection>>,
    events: EventReceiver,
    dispatcher: Option<JoinHandle<()>>,
    readiness: WaitOutcome,
}

impl Hub {
    /// Attach to a connection and wait for the profile's built-in devices
    ///
    /// Returns once the ready set is populated or the wait budget runs out;
    /// check [`Hub::readiness`] for which one happened.
    pub fn connect(
        mut connection: Box<dyn HubConnection>,
        profile: HubProfile,
        options: HubOptions,
    ) -> Result<Self> {
        info!(
            "Connecting {} hub '{}' via {}",
            profile.model,
            profile.name,
            connection.name()
        );

        let events = connection
            .take_events()
            .ok_or_else(|| HubError::NoEventStream(connection.name().to_string()))?;

        let profile = Arc::new(profile);
        let state = Arc::new(Mutex::new(HubState::new()));
        let resolver =
            AttachmentResolver::new(profile.clone(), state.clone(), options.detach_policy);

        let dispatcher = spawn_dispatcher(events.clone(), resolver)?;

        let mut hub = Self {
            profile,
            state,
            waiter: ReadinessWaiter::new(options.wait, options.cancel),
            connection: Some(connection),
            events,
            dispatcher: Some(dispatcher),
            readiness: WaitOutcome::Ready { attempts: 0 },
        };

        hub.readiness = hub.wait_for_devices(None);
        hub.report_status();
        Ok(hub)
    }

    /// Block until `roles` (default: the profile's ready set) are populated
    pub fn wait_for_devices(&self, roles: Option<&[Role]>) -> WaitOutcome {
        let roles = roles.unwrap_or(self.profile.ready_set.as_slice());
        self.waiter
            .wait_until(|| lock_state(&self.state).slots.presence(roles))
    }

    fn report_status(&self) {
        let name = self
            .connection
            .as_ref()
            .map(|c| c.name().to_string())
            .unwrap_or_default();
        info!("{} on {}", self.profile.name, name);
        info!("Roles present: {}", format_roles(&self.populated_roles()));

        if let WaitOutcome::TimedOut { missing, .. } = &self.readiness {
            warn!("Continuing without: {}", format_roles(missing));
        }
    }

    pub fn profile(&self) -> &HubProfile {
        &self.profile
    }

    /// Outcome of the wait performed by [`Hub::connect`]
    pub fn readiness(&self) -> &WaitOutcome {
        &self.readiness
    }

    /// Peripheral bound to `role`, if populated
    pub fn peripheral(&self, role: Role) -> Option<PeripheralHandle> {
        lock_state(&self.state).slots.peripheral(role)
    }

    /// Peripheral bound to `role`, or `MissingPeripheral`
    pub fn require(&self, role: Role) -> Result<PeripheralHandle> {
        self.peripheral(role).ok_or(HubError::MissingPeripheral(role))
    }

    /// Port of the peripheral bound to `role`
    pub fn port_of(&self, role: Role) -> Option<PortId> {
        lock_state(&self.state).slots.get(role).map(|entry| entry.port)
    }

    pub fn populated_roles(&self) -> Vec<Role> {
        lock_state(&self.state).slots.roles()
    }

    /// Every attached peripheral, mapped to a role or not, by port
    pub fn peripherals(&self) -> Vec<(PortId, PeripheralKind)> {
        let state = lock_state(&self.state);
        let mut attached: Vec<_> = state
            .peripherals
            .iter()
            .map(|(port, (kind, _))| (*port, *kind))
            .collect();
        attached.sort_by_key(|(port, _)| *port);
        attached
    }

    /// Close the connection and invalidate every role slot
    pub fn disconnect(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        info!("Disconnecting hub '{}'", self.profile.name);
        let result = connection.disconnect();
        self.events.close();

        if let Some(dispatcher) = self.dispatcher.take()
            && dispatcher.join().is_err()
        {
            error!("Hub event dispatcher panicked");
        }

        let mut state = lock_state(&self.state);
        state.slots.clear_all();
        state.peripherals.clear();

        result.map_err(HubError::from)
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Error disconnecting hub: {}", e);
        }
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("model", &self.profile.model)
            .field("name", &self.profile.name)
            .field("readiness", &self.readiness)
            .finish_non_exhaustive()
    }
}

/// Spawn the thread that applies attach events in arrival order
fn spawn_dispatcher(
    events: EventReceiver,
    resolver: AttachmentResolver,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("hub-events".to_string())
        .spawn(move || {
            debug!("Hub event dispatcher started");
            while let Ok(event) = events.recv_blocking() {
                resolver.handle_event(event);
            }
            debug!("Hub event dispatcher stopped");
        })
}
