use chrono::Utc;
use tracing::debug;

use crate::model::{
    Controller, ControllerId, Device, DeviceId, DeviceState, NewController, NewDevice,
    StoreSnapshot,
};

/// In-memory registry of devices and controllers, kept in insertion order.
///
/// Operations on unknown ids are no-ops and report `None` rather than failing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeviceStore {
    devices: Vec<Device>,
    controllers: Vec<Controller>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self { devices: snapshot.devices, controllers: snapshot.controllers }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot { devices: self.devices.clone(), controllers: self.controllers.clone() }
    }

    pub fn replace_devices(&mut self, devices: Vec<Device>) {
        self.devices = devices;
    }

    pub fn replace_controllers(&mut self, controllers: Vec<Controller>) {
        self.controllers = controllers;
    }

    pub fn add_device(&mut self, fields: NewDevice) -> Device {
        let device = Device {
            id: DeviceId::new(),
            name: fields.name,
            kind: fields.kind,
            location: fields.location,
            description: fields.description,
            state: fields.state.unwrap_or_default(),
            usage_count: 0,
            created_at: Utc::now(),
            last_updated: None,
        };
        debug!(device_id = %device.id, name = %device.name, "device added");
        self.devices.push(device.clone());
        device
    }

    pub fn remove_device(&mut self, id: DeviceId) -> Option<Device> {
        let pos = self.devices.iter().position(|d| d.id == id)?;
        debug!(device_id = %id, "device removed");
        Some(self.devices.remove(pos))
    }

    /// Returns the updated device, or `None` when the id is unknown.
    pub fn update_device_state(&mut self, id: DeviceId, state: DeviceState) -> Option<Device> {
        let device = self.devices.iter_mut().find(|d| d.id == id)?;
        device.state = state;
        device.last_updated = Some(Utc::now());
        if state.counts_as_use() {
            device.usage_count += 1;
        }
        debug!(device_id = %id, %state, usage = device.usage_count, "device state updated");
        Some(device.clone())
    }

    pub fn find_device(&self, id: DeviceId) -> Option<Device> {
        self.devices.iter().find(|d| d.id == id).cloned()
    }

    pub fn list_devices(&self) -> Vec<Device> {
        self.devices.clone()
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn add_controller(&mut self, fields: NewController) -> Controller {
        let controller = Controller {
            id: ControllerId::new(),
            name: fields.name,
            kind: fields.kind,
            mac_address: fields.mac_address,
            connected: false,
            description: fields.description,
            created_at: Utc::now(),
        };
        debug!(controller_id = %controller.id, kind = ?controller.kind, "controller added");
        self.controllers.push(controller.clone());
        controller
    }

    pub fn remove_controller(&mut self, id: ControllerId) -> Option<Controller> {
        let pos = self.controllers.iter().position(|c| c.id == id)?;
        debug!(controller_id = %id, "controller removed");
        Some(self.controllers.remove(pos))
    }

    pub fn set_connected(&mut self, id: ControllerId, connected: bool) -> Option<Controller> {
        let controller = self.controllers.iter_mut().find(|c| c.id == id)?;
        controller.connected = connected;
        debug!(controller_id = %id, connected, "controller connection changed");
        Some(controller.clone())
    }

    pub fn find_controller(&self, id: ControllerId) -> Option<Controller> {
        self.controllers.iter().find(|c| c.id == id).cloned()
    }

    pub fn list_controllers(&self) -> Vec<Controller> {
        self.controllers.clone()
    }

    pub fn controllers(&self) -> impl Iterator<Item = &Controller> {
        self.controllers.iter()
    }
}
