use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{
    command_log::{CommandLog, CommandUsage},
    events::{EventHub, HomeEvent, SubscriptionToken},
    model::{
        Command, Controller, ControllerId, Device, DeviceId, DeviceState, NewController, NewDevice,
        StoreSnapshot,
    },
    persistence::{
        COLLECTION_APPLIANCE_INFO, COLLECTION_COMMANDS, COLLECTION_CONTROLLERS, COLLECTION_DEVICES,
        Persistence,
    },
    stats::{ApplianceInfo, ApplianceRecord},
    store::DeviceStore,
};

/// Everything the UI acts on, wired together.
///
/// Each mutating call applies the change, appends to the command log where
/// relevant, queues a save of the touched collections and then notifies
/// subscribers. Unknown ids change nothing and notify nobody.
#[derive(Debug)]
pub struct SmartHome {
    store: DeviceStore,
    commands: CommandLog,
    appliances: ApplianceInfo,
    events: EventHub<HomeEvent>,
    persistence: Persistence,
}

impl SmartHome {
    pub fn new(persistence: Persistence) -> Self {
        Self {
            store: DeviceStore::new(),
            commands: CommandLog::new(),
            appliances: ApplianceInfo::new(),
            events: EventHub::new(),
            persistence,
        }
    }

    /// Rehydrates from whatever `persistence` holds; missing or corrupt
    /// collections start empty.
    pub async fn load(persistence: Persistence) -> Self {
        let devices: Vec<Device> = persistence.load(COLLECTION_DEVICES).await;
        let controllers: Vec<Controller> = persistence.load(COLLECTION_CONTROLLERS).await;
        let commands: CommandLog = persistence.load(COLLECTION_COMMANDS).await;
        let appliances: ApplianceInfo = persistence.load(COLLECTION_APPLIANCE_INFO).await;
        info!(
            devices = devices.len(),
            controllers = controllers.len(),
            commands = commands.len(),
            "home state loaded"
        );
        Self {
            store: DeviceStore::from_snapshot(StoreSnapshot { devices, controllers }),
            commands,
            appliances,
            events: EventHub::new(),
            persistence,
        }
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionToken
    where
        F: Fn(&HomeEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.events.unsubscribe(token)
    }

    pub fn store(&self) -> &DeviceStore {
        &self.store
    }

    pub fn command_log(&self) -> &CommandLog {
        &self.commands
    }

    pub fn appliance_info(&self) -> &ApplianceInfo {
        &self.appliances
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    fn persist_store(&self) {
        let snapshot = self.store.snapshot();
        self.persistence.save(COLLECTION_DEVICES, &snapshot.devices);
        self.persistence.save(COLLECTION_CONTROLLERS, &snapshot.controllers);
    }

    fn persist_commands(&self) {
        self.persistence.save(COLLECTION_COMMANDS, self.commands.commands());
    }

    pub fn add_device(&mut self, fields: NewDevice) -> Device {
        let device = self.store.add_device(fields);
        self.persist_store();
        self.events.emit(&HomeEvent::DeviceAdded { device: device.clone() });
        device
    }

    /// Commands that reference the device stay in the log.
    pub fn remove_device(&mut self, id: DeviceId) -> Option<Device> {
        let removed = self.store.remove_device(id)?;
        self.persist_store();
        self.events.emit(&HomeEvent::DeviceRemoved { device_id: id });
        Some(removed)
    }

    pub fn update_device_state(&mut self, id: DeviceId, state: DeviceState) -> Option<Device> {
        let from = self.store.find_device(id)?.state;
        let device = self.store.update_device_state(id, state)?;
        let command = self.commands.record(id, device.name.clone(), state.as_str());
        self.persist_store();
        self.persist_commands();
        self.events.emit(&HomeEvent::DeviceStateChanged {
            device_id: id,
            from,
            to: state,
            usage_count: device.usage_count,
        });
        self.events.emit(&HomeEvent::CommandRecorded { command });
        Some(device)
    }

    pub fn find_device(&self, id: DeviceId) -> Option<Device> {
        self.store.find_device(id)
    }

    pub fn list_devices(&self) -> Vec<Device> {
        self.store.list_devices()
    }

    pub fn add_controller(&mut self, fields: NewController) -> Controller {
        let controller = self.store.add_controller(fields);
        self.persist_store();
        self.events.emit(&HomeEvent::ControllerAdded { controller: controller.clone() });
        controller
    }

    pub fn remove_controller(&mut self, id: ControllerId) -> Option<Controller> {
        let removed = self.store.remove_controller(id)?;
        self.persist_store();
        self.events.emit(&HomeEvent::ControllerRemoved { controller_id: id });
        Some(removed)
    }

    pub fn set_connected(&mut self, id: ControllerId, connected: bool) -> Option<Controller> {
        let controller = self.store.set_connected(id, connected)?;
        self.persist_store();
        self.events.emit(&HomeEvent::ControllerConnection { controller_id: id, connected });
        Some(controller)
    }

    pub fn list_controllers(&self) -> Vec<Controller> {
        self.store.list_controllers()
    }

    /// Records an arbitrary action, e.g. one issued by voice or a scene.
    pub fn record_command(
        &mut self,
        device_id: DeviceId,
        device_name: impl Into<String>,
        action: impl Into<String>,
    ) -> Command {
        let command = self.commands.record(device_id, device_name, action);
        self.persist_commands();
        self.events.emit(&HomeEvent::CommandRecorded { command: command.clone() });
        command
    }

    pub fn top_commands(&self, n: usize) -> Vec<CommandUsage> {
        self.commands.top_commands(n)
    }

    pub fn most_used(&self) -> Vec<CommandUsage> {
        self.commands.most_used()
    }

    pub fn history(&self, n: usize) -> Vec<Command> {
        self.commands.history(n)
    }

    pub fn update_appliance_info(
        &mut self,
        device_id: DeviceId,
        info: BTreeMap<String, Value>,
    ) -> ApplianceRecord {
        let record = self.appliances.update(device_id, info).clone();
        self.persistence.save(COLLECTION_APPLIANCE_INFO, &self.appliances);
        self.events.emit(&HomeEvent::ApplianceInfoUpdated { device_id });
        record
    }

    /// Forgets every device, controller, command and appliance record, in
    /// memory and in storage. Subscribers stay attached.
    pub fn clear_all(&mut self) {
        self.store = DeviceStore::new();
        self.commands = CommandLog::new();
        self.appliances = ApplianceInfo::new();
        self.persistence.clear_all();
        info!("home state cleared");
        self.events.emit(&HomeEvent::HomeCleared);
    }

    /// Adds the demo devices when the home is empty. Returns how many were added.
    pub fn seed_demo_devices(&mut self) -> usize {
        if self.store.device_count() > 0 {
            return 0;
        }
        let demo = [
            NewDevice::new("Living Room Lamp", "Light")
                .with_location("Living Room")
                .with_state(DeviceState::On),
            NewDevice::new("Bedroom AC", "Climate")
                .with_location("Bedroom")
                .with_state(DeviceState::Running),
            NewDevice::new("Front Door Lock", "Security")
                .with_location("Entrance")
                .with_state(DeviceState::Off),
            NewDevice::new("Garage Sensor", "Sensor")
                .with_location("Garage")
                .with_state(DeviceState::Malfunction),
        ];
        let n = demo.len();
        for fields in demo {
            self.add_device(fields);
        }
        debug!(count = n, "seeded demo devices");
        n
    }
}
