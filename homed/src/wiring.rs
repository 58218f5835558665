use std::sync::{Arc, Mutex as StdMutex};

use anyhow::Result;
use home_core::{
    home::SmartHome,
    navigation::{NavigationManager, QrScanner},
    persistence::{FailureHook, Persistence},
    storage::{BlobStore, FileBlobStore, InMemoryBlobStore},
};
use metrics::counter;
use tokio::sync::{Mutex, broadcast};

use crate::{
    config::{Config, StorageKind},
    state::AppState,
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub async fn build_state(cfg: &Config) -> Result<AppState> {
    let blobs: Arc<dyn BlobStore> = match cfg.storage.kind {
        StorageKind::InMem => Arc::new(InMemoryBlobStore::default()),
        StorageKind::File => Arc::new(FileBlobStore::open(&cfg.storage.data_dir).await?),
    };

    let on_failure: FailureHook = Arc::new(|key: &str| {
        counter!("home.persistence.error").increment(1);
        tracing::debug!(%key, "counted persistence failure");
    });
    let persistence = Persistence::spawn_with(blobs, cfg.storage.key_prefix.clone(), Some(on_failure));

    let mut home = SmartHome::load(persistence).await;
    if cfg.seed_demo {
        let seeded = home.seed_demo_devices();
        if seeded > 0 {
            tracing::info!(count = seeded, "seeded demo devices");
        }
    }

    let (events, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let tx = events.clone();
    home.subscribe(move |ev| {
        // no receivers is fine
        let _ = tx.send(ev.clone());
    });

    let mut navigation = NavigationManager::new(cfg.navigation.room_database());
    navigation.set_target(cfg.navigation.target.clone());
    let navigation = Arc::new(StdMutex::new(navigation));
    let mut scanner = QrScanner::new();
    NavigationManager::attach(navigation.clone(), &mut scanner);

    Ok(AppState {
        home: Arc::new(Mutex::new(home)),
        events,
        routines: Default::default(),
        scanner: Arc::new(StdMutex::new(scanner)),
        navigation,
    })
}
