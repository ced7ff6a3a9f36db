//! Attachment resolver integration tests
//!
//! Covers port-table resolution properties, secondary slots and concurrent
//! event delivery.
//!
//! Run with: `cargo test -p hub --test resolver_tests`

use common::test_utils::{mock_attach, mock_peripheral, same_handle};
use common::{AttachChange, AttachEvent, PeripheralHandle};
use hub::{AttachmentResolver, DetachPolicy, HubModel, HubState, PortTable, ports};
use proptest::prelude::*;
use protocol::{PeripheralKind, PortId, Role};
use std::sync::{Arc, Mutex};
use std::thread;

fn setup(model: HubModel) -> (AttachmentResolver, Arc<Mutex<HubState>>) {
    let state = Arc::new(Mutex::new(HubState::new()));
    let resolver = AttachmentResolver::new(
        Arc::new(model.profile()),
        state.clone(),
        DetachPolicy::Clear,
    );
    (resolver, state)
}

fn handle_of(event: &AttachEvent) -> PeripheralHandle {
    match &event.change {
        AttachChange::Attached { peripheral, .. } => peripheral.clone(),
        AttachChange::Detached => panic!("not an attach event"),
    }
}

fn kind_strategy() -> impl Strategy<Value = PeripheralKind> {
    prop_oneof![
        Just(PeripheralKind::Motor),
        Just(PeripheralKind::TrainMotor),
        Just(PeripheralKind::EncodedMotor),
        Just(PeripheralKind::LedLight),
        Just(PeripheralKind::RgbLight),
        Just(PeripheralKind::TiltSensor),
        Just(PeripheralKind::VisionSensor),
        Just(PeripheralKind::Current),
        Just(PeripheralKind::Voltage),
        (0x40u16..0x80).prop_map(PeripheralKind::Unknown),
    ]
}

fn model_strategy() -> impl Strategy<Value = HubModel> {
    prop_oneof![
        Just(HubModel::MoveHub),
        Just(HubModel::SmartHub),
        Just(HubModel::TechnicMoveHub),
    ]
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_custom_table_scenario() {
    let table = PortTable::new([
        (PortId(0x00), Role::MotorA),
        (PortId(0x01), Role::MotorB),
        (PortId(0x10), Role::MotorAB),
    ])
    .unwrap();
    let mut profile = HubModel::MoveHub.profile();
    profile.table = table;

    let state = Arc::new(Mutex::new(HubState::new()));
    let resolver = AttachmentResolver::new(Arc::new(profile), state.clone(), DetachPolicy::Clear);

    resolver.handle_event(mock_attach(0x00, PeripheralKind::EncodedMotor));
    resolver.handle_event(mock_attach(0x01, PeripheralKind::EncodedMotor));

    let state = state.lock().unwrap();
    assert!(state.slots.is_populated(Role::MotorA));
    assert!(state.slots.is_populated(Role::MotorB));
    assert!(!state.slots.is_populated(Role::MotorAB));
}

#[test]
fn test_vision_sensor_on_unmapped_port() {
    let (resolver, state) = setup(HubModel::SmartHub);
    let event = mock_attach(0x05, PeripheralKind::VisionSensor);
    let handle = handle_of(&event);

    resolver.handle_event(event);

    let state = state.lock().unwrap();
    assert_eq!(state.slots.roles(), vec![Role::VisionSensor]);
    assert!(same_handle(
        &state.slots.peripheral(Role::VisionSensor).unwrap(),
        &handle
    ));
}

#[test]
fn test_later_attach_replaces_slot() {
    let (resolver, state) = setup(HubModel::MoveHub);
    resolver.handle_event(mock_attach(0x03, PeripheralKind::EncodedMotor));
    let replacement = mock_attach(0x03, PeripheralKind::VisionSensor);
    let handle = handle_of(&replacement);
    resolver.handle_event(replacement);

    let state = state.lock().unwrap();
    assert!(same_handle(&state.slots.peripheral(Role::PortD).unwrap(), &handle));
    assert!(same_handle(
        &state.slots.peripheral(Role::VisionSensor).unwrap(),
        &handle
    ));
    // Earlier external motor stays bound until its own port detaches
    assert!(state.slots.is_populated(Role::MotorExternal));
}

#[test]
fn test_virtual_port_attach_resolves() {
    let (resolver, state) = setup(HubModel::MoveHub);
    let handle = mock_peripheral(ports::AB, PeripheralKind::EncodedMotor);
    resolver.handle_event(AttachEvent::attached_virtual(
        ports::AB,
        PeripheralKind::EncodedMotor,
        handle.clone(),
    ));

    let state = state.lock().unwrap();
    assert!(same_handle(&state.slots.peripheral(Role::MotorAB).unwrap(), &handle));
    assert!(!state.slots.is_populated(Role::MotorExternal));
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[test]
fn test_concurrent_events_never_tear_slots() {
    let (resolver, state) = setup(HubModel::MoveHub);
    let rounds = 500;

    let writers: Vec<_> = [0x00u8, 0x01u8]
        .into_iter()
        .map(|port| {
            let resolver = resolver.clone();
            thread::spawn(move || {
                for i in 0..rounds {
                    let kind = if i % 2 == 0 {
                        PeripheralKind::EncodedMotor
                    } else {
                        PeripheralKind::Motor
                    };
                    resolver.handle_event(mock_attach(port, kind));
                }
            })
        })
        .collect();

    let reader = {
        let state = state.clone();
        thread::spawn(move || {
            for _ in 0..rounds {
                let state = state.lock().unwrap();
                for role in [Role::MotorA, Role::MotorB] {
                    if let Some(entry) = state.slots.get(role) {
                        assert_eq!(entry.peripheral.port(), entry.port);
                        assert_eq!(entry.peripheral.kind(), entry.kind);
                        let registered = state.peripheral_at(entry.port).unwrap();
                        assert!(same_handle(registered, &entry.peripheral));
                    }
                }
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.slots.get(Role::MotorA).unwrap().port, ports::A);
    assert_eq!(state.slots.get(Role::MotorB).unwrap().port, ports::B);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_mapped_port_slot_equals_handle(
        model in model_strategy(),
        index in 0usize..16,
        kind in kind_strategy(),
    ) {
        let profile = model.profile();
        let entries = profile.table.entries();
        let (port, role) = entries[index % entries.len()];

        let (resolver, state) = setup(model);
        let event = AttachEvent::attached(port, kind, mock_peripheral(port, kind));
        let handle = handle_of(&event);

        resolver.handle_event(event.clone());
        resolver.handle_event(event);

        let state = state.lock().unwrap();
        let bound = state.slots.peripheral(role).unwrap();
        prop_assert!(same_handle(&bound, &handle));
    }

    #[test]
    fn prop_unmapped_port_leaves_slots_unchanged(
        model in model_strategy(),
        port in 0x40u8..0x80,
        kind in prop_oneof![
            Just(PeripheralKind::LedLight),
            Just(PeripheralKind::Current),
            Just(PeripheralKind::TiltSensor),
            (0x40u16..0x80).prop_map(PeripheralKind::Unknown),
        ],
    ) {
        let (resolver, state) = setup(model);
        resolver.handle_event(mock_attach(0x32, PeripheralKind::RgbLight));
        let before = state.lock().unwrap().slots.roles();

        resolver.handle_event(mock_attach(port, kind));

        let after = state.lock().unwrap().slots.roles();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn prop_vision_sensor_always_secondary(
        model in model_strategy(),
        port in 0x00u8..0x40,
    ) {
        let (resolver, state) = setup(model);
        let event = mock_attach(port, PeripheralKind::VisionSensor);
        let handle = handle_of(&event);
        resolver.handle_event(event);

        let state = state.lock().unwrap();
        let vision = state.slots.peripheral(Role::VisionSensor).unwrap();
        prop_assert!(same_handle(&vision, &handle));
        prop_assert!(!state.slots.is_populated(Role::MotorExternal));
    }

    #[test]
    fn prop_external_motor_outside_primary_ports(
        port in 0x00u8..0x40,
        kind in prop_oneof![
            Just(PeripheralKind::Motor),
            Just(PeripheralKind::TrainMotor),
            Just(PeripheralKind::EncodedMotor),
        ],
    ) {
        let (resolver, state) = setup(HubModel::MoveHub);
        resolver.handle_event(mock_attach(port, kind));

        let primary = [ports::A, ports::B, ports::AB].contains(&PortId(port));
        let state = state.lock().unwrap();
        prop_assert_eq!(state.slots.is_populated(Role::MotorExternal), !primary);
    }
}
