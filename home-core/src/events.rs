use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Command, Controller, ControllerId, Device, DeviceId, DeviceState};

type Handler<E> = Box<dyn Fn(&E) + Send + Sync>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionToken(u64);

/// Synchronous observer list. `emit` calls every handler in registration order
/// before returning.
pub struct EventHub<E> {
    next_token: u64,
    handlers: Vec<(SubscriptionToken, Handler<E>)>,
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self { next_token: 0, handlers: Vec::new() }
    }
}

impl<E> fmt::Debug for EventHub<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub").field("handlers", &self.handlers.len()).finish()
    }
}

impl<E> EventHub<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionToken
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.handlers.push((token, Box::new(handler)));
        token
    }

    /// Returns false if the token was already removed.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(t, _)| *t != token);
        self.handlers.len() != before
    }

    pub fn emit(&self, event: &E) {
        for (_, handler) in &self.handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HomeEvent {
    DeviceAdded { device: Device },
    DeviceRemoved { device_id: DeviceId },
    DeviceStateChanged { device_id: DeviceId, from: DeviceState, to: DeviceState, usage_count: u64 },
    ControllerAdded { controller: Controller },
    ControllerRemoved { controller_id: ControllerId },
    ControllerConnection { controller_id: ControllerId, connected: bool },
    CommandRecorded { command: Command },
    ApplianceInfoUpdated { device_id: DeviceId },
    HomeCleared,
}

impl HomeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            HomeEvent::DeviceAdded { .. } => "device_added",
            HomeEvent::DeviceRemoved { .. } => "device_removed",
            HomeEvent::DeviceStateChanged { .. } => "device_state_changed",
            HomeEvent::ControllerAdded { .. } => "controller_added",
            HomeEvent::ControllerRemoved { .. } => "controller_removed",
            HomeEvent::ControllerConnection { .. } => "controller_connection",
            HomeEvent::CommandRecorded { .. } => "command_recorded",
            HomeEvent::ApplianceInfoUpdated { .. } => "appliance_info_updated",
            HomeEvent::HomeCleared => "home_cleared",
        }
    }
}
