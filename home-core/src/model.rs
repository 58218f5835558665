use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{self, HomeError};

macro_rules! time_ordered_id {
    ($name:ident) => {
        #[repr(transparent)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Time-ordered, so ids sort by creation.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::try_parse(s).map(Self)
            }
        }
    };
}

time_ordered_id!(DeviceId);
time_ordered_id!(ControllerId);
time_ordered_id!(CommandId);

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    On,
    #[default]
    Off,
    Running,
    Malfunction,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::On => "ON",
            DeviceState::Off => "OFF",
            DeviceState::Running => "RUNNING",
            DeviceState::Malfunction => "MALFUNCTION",
        }
    }

    /// Transitions into these states count as a use of the device.
    pub fn counts_as_use(&self) -> bool {
        matches!(self, DeviceState::On | DeviceState::Running)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceState {
    type Err = HomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ON" => Ok(DeviceState::On),
            "OFF" => Ok(DeviceState::Off),
            "RUNNING" => Ok(DeviceState::Running),
            "MALFUNCTION" => Ok(DeviceState::Malfunction),
            other => Err(HomeError::Validation(format!("unknown device state: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub state: DeviceState,
    #[serde(default)]
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Fields a caller supplies when adding a device. Everything else is assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<DeviceState>,
}

impl NewDevice {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { name: name.into(), kind: kind.into(), ..Self::default() }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn validate(&self) -> error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(HomeError::Validation("device name must not be empty".into()));
        }
        if self.kind.trim().is_empty() {
            return Err(HomeError::Validation("device type must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Bluetooth,
    Wifi,
    Zigbee,
    Zwave,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    pub id: ControllerId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ControllerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewController {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ControllerKind,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewController {
    pub fn new(name: impl Into<String>, kind: ControllerKind) -> Self {
        Self { name: name.into(), kind, mac_address: None, description: None }
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac_address = Some(mac.into());
        self
    }

    pub fn validate(&self) -> error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(HomeError::Validation("controller name must not be empty".into()));
        }
        match (&self.kind, self.mac_address.as_deref()) {
            (ControllerKind::Bluetooth, None) => {
                Err(HomeError::Validation("bluetooth controllers require a MAC address".into()))
            }
            (_, Some(mac)) if !is_mac_address(mac) => {
                Err(HomeError::Validation(format!("invalid MAC address: {mac}")))
            }
            _ => Ok(()),
        }
    }
}

/// Six hex octets separated by `:` or `-`.
fn is_mac_address(s: &str) -> bool {
    let parts: Vec<&str> = s.split([':', '-']).collect();
    parts.len() == 6
        && parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: CommandId,
    pub device_id: DeviceId,
    pub device_name: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub controllers: Vec<Controller>,
}
