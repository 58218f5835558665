//! Room lookup driven by QR scans.
//!
//! A [`QrScanner`] publishes detections; a [`NavigationManager`] attached to it
//! resolves the scanned room, moves the active anchor to the scan pose and
//! reports whether the user reached the target room.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use crate::events::{EventHub, SubscriptionToken};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: Some(name.into()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomDatabase {
    rooms: Vec<Room>,
}

impl RoomDatabase {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { rooms: ids.into_iter().map(Room::new).collect() }
    }

    pub fn test_rooms() -> Self {
        Self::new(vec![
            Room::named("Room101", "Entrance"),
            Room::named("Room102", "Reception"),
            Room::named("Room201", "Meeting Room A"),
            Room::named("Room202", "Meeting Room B"),
            Room::named("LabA", "Lab A"),
            Room::named("LabB", "Lab B"),
            Room::named("Office1", "Office 1"),
            Room::named("Office2", "Cafeteria"),
            Room::named("Exit", "Building Exit"),
        ])
    }

    /// The id is the decoded QR text. Empty ids never match.
    pub fn get_room(&self, id: &str) -> Option<&Room> {
        if id.is_empty() {
            return None;
        }
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrDetection {
    pub room_id: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
}

/// Stand-in for the camera QR decoder; callers feed detections in.
#[derive(Debug, Default)]
pub struct QrScanner {
    hub: EventHub<QrDetection>,
}

impl QrScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionToken
    where
        F: Fn(&QrDetection) + Send + Sync + 'static,
    {
        self.hub.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.hub.unsubscribe(token)
    }

    pub fn on_qr_detected(&self, room_id: impl Into<String>, position: Vec3, rotation: Quat) {
        self.hub.emit(&QrDetection { room_id: room_id.into(), position, rotation });
    }
}

/// Where room content was last placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub room_id: String,
    pub position: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    UnknownRoom { room_id: String },
    DestinationReached { room_id: String },
    Guiding { from: String, to: String },
    /// Known room, but no usable target to guide to.
    Located { room_id: String },
}

#[derive(Debug, Clone, Default)]
pub struct NavigationManager {
    rooms: RoomDatabase,
    target: Option<String>,
    current: Option<String>,
    anchor: Option<Anchor>,
    last_outcome: Option<NavigationOutcome>,
}

impl NavigationManager {
    pub fn new(rooms: RoomDatabase) -> Self {
        Self { rooms, ..Self::default() }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.set_target(Some(target.into()));
        self
    }

    pub fn set_target(&mut self, target: Option<String>) {
        self.target = target.filter(|t| !t.is_empty());
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn rooms(&self) -> &RoomDatabase {
        &self.rooms
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.current.as_deref().and_then(|id| self.rooms.get_room(id))
    }

    pub fn active_anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&NavigationOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn on_room_scanned(&mut self, scan: &QrDetection) -> NavigationOutcome {
        let outcome = self.resolve(scan);
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    fn resolve(&mut self, scan: &QrDetection) -> NavigationOutcome {
        if self.rooms.get_room(&scan.room_id).is_none() {
            info!(room_id = %scan.room_id, "unknown QR scanned");
            self.current = None;
            return NavigationOutcome::UnknownRoom { room_id: scan.room_id.clone() };
        }

        self.current = Some(scan.room_id.clone());
        // a new scan replaces whatever content was placed before
        self.anchor = Some(Anchor {
            room_id: scan.room_id.clone(),
            position: scan.position,
            rotation: scan.rotation,
        });

        match self.target.as_deref() {
            Some(target) if target == scan.room_id => {
                info!(room_id = %scan.room_id, "destination reached");
                NavigationOutcome::DestinationReached { room_id: scan.room_id.clone() }
            }
            Some(target) if self.rooms.get_room(target).is_some() => {
                info!(from = %scan.room_id, to = %target, "navigating");
                NavigationOutcome::Guiding { from: scan.room_id.clone(), to: target.to_string() }
            }
            _ => {
                debug!(room_id = %scan.room_id, "room located, no target");
                NavigationOutcome::Located { room_id: scan.room_id.clone() }
            }
        }
    }

    /// Feeds every detection from `scanner` into `manager`.
    pub fn attach(manager: Arc<Mutex<Self>>, scanner: &mut QrScanner) -> SubscriptionToken {
        scanner.subscribe(move |scan| {
            manager.lock().unwrap_or_else(PoisonError::into_inner).on_room_scanned(scan);
        })
    }
}
