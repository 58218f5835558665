use home_core::{
    command_log::{CommandLog, CommandUsage},
    model::{ControllerKind, DeviceId, DeviceState, NewController, NewDevice, StoreSnapshot},
    store::DeviceStore,
};

fn lamp() -> NewDevice {
    NewDevice {
        name: "Desk Lamp".into(),
        kind: "Light".into(),
        location: Some("Office".into()),
        description: Some("warm white".into()),
        state: None,
    }
}

#[test]
fn added_device_is_found_with_same_fields() {
    let mut store = DeviceStore::new();
    let added = store.add_device(lamp());
    let found = store.find_device(added.id).expect("device present");

    assert_eq!(found, added);
    assert_eq!(found.name, "Desk Lamp");
    assert_eq!(found.kind, "Light");
    assert_eq!(found.location.as_deref(), Some("Office"));
    assert_eq!(found.description.as_deref(), Some("warm white"));
    assert_eq!(found.state, DeviceState::Off);
    assert_eq!(found.usage_count, 0);
    assert!(found.last_updated.is_none());
}

#[test]
fn ids_are_unique() {
    let mut store = DeviceStore::new();
    let a = store.add_device(lamp());
    let b = store.add_device(lamp());
    assert_ne!(a.id, b.id);
    assert_eq!(store.device_count(), 2);
}

#[test]
fn switching_on_increments_usage_monotonically() {
    let mut store = DeviceStore::new();
    let id = store.add_device(lamp()).id;

    let d = store.update_device_state(id, DeviceState::On).unwrap();
    assert_eq!(d.usage_count, 1);

    let mut last = d.usage_count;
    for state in [DeviceState::On, DeviceState::Running, DeviceState::On] {
        let d = store.update_device_state(id, state).unwrap();
        assert!(d.usage_count > last);
        last = d.usage_count;
    }
    assert_eq!(last, 4);
}

#[test]
fn switching_off_never_changes_usage() {
    let mut store = DeviceStore::new();
    let id = store.add_device(lamp()).id;
    store.update_device_state(id, DeviceState::On);

    for _ in 0..3 {
        let d = store.update_device_state(id, DeviceState::Off).unwrap();
        assert_eq!(d.usage_count, 1);
        assert_eq!(d.state, DeviceState::Off);
        assert!(d.last_updated.is_some());
    }
}

#[test]
fn updating_unknown_device_is_noop() {
    let mut store = DeviceStore::new();
    store.add_device(lamp());
    let before = store.clone();
    assert!(store.update_device_state(DeviceId::new(), DeviceState::On).is_none());
    assert_eq!(store, before);
}

#[test]
fn removing_unknown_id_leaves_store_unchanged() {
    let mut store = DeviceStore::new();
    store.add_device(lamp());
    store.add_controller(NewController::new("Bridge", ControllerKind::Zigbee));
    let before = store.clone();

    assert!(store.remove_device(DeviceId::new()).is_none());
    assert_eq!(store, before);
}

#[test]
fn controllers_start_disconnected_and_toggle() {
    let mut store = DeviceStore::new();
    let c = store.add_controller(
        NewController::new("Phone", ControllerKind::Bluetooth).with_mac("00:1A:7D:DA:71:13"),
    );
    assert!(!c.connected);

    assert!(store.set_connected(c.id, true).unwrap().connected);
    assert!(store.find_controller(c.id).unwrap().connected);
    assert!(!store.set_connected(c.id, false).unwrap().connected);

    assert!(store.remove_controller(c.id).is_some());
    assert!(store.list_controllers().is_empty());
}

#[test]
fn snapshot_roundtrips_through_json() {
    let mut store = DeviceStore::new();
    let id = store.add_device(lamp()).id;
    store.add_device(NewDevice::new("AC", "Climate").with_state(DeviceState::Running));
    store.update_device_state(id, DeviceState::On);
    let c = store.add_controller(NewController::new("Router", ControllerKind::Wifi));
    store.set_connected(c.id, true);

    let snapshot = store.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: StoreSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
    assert_eq!(DeviceStore::from_snapshot(back), store);
}

#[test]
fn top_commands_ranks_by_count() {
    let (d1, d2) = (DeviceId::new(), DeviceId::new());
    let mut log = CommandLog::new();
    for _ in 0..3 {
        log.record(d1, "Lamp", "ON");
    }
    log.record(d1, "Lamp", "OFF");
    for _ in 0..2 {
        log.record(d2, "Fan", "ON");
    }

    let usage = |device_id, action: &str, count| CommandUsage {
        device_id,
        action: action.to_string(),
        count,
    };
    assert_eq!(
        log.top_commands(3),
        vec![usage(d1, "ON", 3), usage(d2, "ON", 2), usage(d1, "OFF", 1)]
    );
    assert_eq!(log.top_commands(1), vec![usage(d1, "ON", 3)]);
}
