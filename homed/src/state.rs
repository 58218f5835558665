use std::{collections::HashMap, sync::Arc};

use home_core::{
    events::HomeEvent,
    home::SmartHome,
    navigation::{NavigationManager, QrScanner},
    schedule::SequenceHandle,
};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

pub type Routines = Arc<Mutex<HashMap<Uuid, SequenceHandle>>>;

#[derive(Clone)]
pub struct AppState {
    pub home: Arc<Mutex<SmartHome>>,
    /// Every `HomeEvent`, fanned out to subscribers and websocket clients.
    pub events: broadcast::Sender<HomeEvent>,
    pub routines: Routines,
    pub scanner: Arc<std::sync::Mutex<QrScanner>>,
    pub navigation: Arc<std::sync::Mutex<NavigationManager>>,
}
