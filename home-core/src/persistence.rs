use serde::{Serialize, de::DeserializeOwned};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::storage::{BlobStore, InMemoryBlobStore};

pub const DEFAULT_KEY_PREFIX: &str = "@smart_home";

pub const COLLECTION_DEVICES: &str = "devices";
pub const COLLECTION_CONTROLLERS: &str = "controllers";
pub const COLLECTION_COMMANDS: &str = "commands";
pub const COLLECTION_APPLIANCE_INFO: &str = "appliance_info";

pub const COLLECTIONS: [&str; 4] =
    [COLLECTION_DEVICES, COLLECTION_CONTROLLERS, COLLECTION_COMMANDS, COLLECTION_APPLIANCE_INFO];

/// Called with the blob key whenever a background write or delete fails.
pub type FailureHook = Arc<dyn Fn(&str) + Send + Sync>;

enum Op {
    Put { key: String, bytes: Vec<u8> },
    Delete { key: String },
    Flush(oneshot::Sender<()>),
}

/// Best-effort JSON persistence of named collections.
///
/// `save` never blocks and never fails: records are serialized on the caller's
/// side and handed to a single writer task, so writes land in call order.
/// Failed writes are logged and dropped. `load` falls back to `T::default()`
/// for missing or unreadable data.
#[derive(Clone)]
pub struct Persistence {
    blobs: Arc<dyn BlobStore>,
    prefix: String,
    tx: mpsc::UnboundedSender<Op>,
    failures: Arc<AtomicU64>,
}

impl Persistence {
    /// Must be called from within a tokio runtime.
    pub fn spawn(blobs: Arc<dyn BlobStore>) -> Self {
        Self::spawn_with(blobs, DEFAULT_KEY_PREFIX, None)
    }

    pub fn in_memory() -> Self {
        Self::spawn(Arc::new(InMemoryBlobStore::default()))
    }

    pub fn spawn_with(
        blobs: Arc<dyn BlobStore>,
        prefix: impl Into<String>,
        on_failure: Option<FailureHook>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let failures = Arc::new(AtomicU64::new(0));
        tokio::spawn(run_writer(blobs.clone(), rx, failures.clone(), on_failure));
        Self { blobs, prefix: prefix.into(), tx, failures }
    }

    fn key(&self, collection: &str) -> String {
        format!("{}:{}", self.prefix, collection)
    }

    pub fn save<T>(&self, collection: &str, records: &T)
    where
        T: Serialize + ?Sized,
    {
        let key = self.key(collection);
        let bytes = match serde_json::to_vec(records) {
            Ok(b) => b,
            Err(e) => {
                warn!(%key, error = %e, "failed to serialize collection");
                self.failures.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        if self.tx.send(Op::Put { key, bytes }).is_err() {
            warn!(collection, "persistence writer is gone, dropping save");
        }
    }

    pub async fn load<T>(&self, collection: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.flush().await;
        let key = self.key(collection);
        match self.blobs.get(&key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(%key, error = %e, "corrupt collection, starting empty");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!(%key, error = %e, "failed to load collection, starting empty");
                T::default()
            }
        }
    }

    /// Waits until every save issued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Op::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    pub fn clear_all(&self) {
        for collection in COLLECTIONS {
            let _ = self.tx.send(Op::Delete { key: self.key(collection) });
        }
    }

    /// Count of writes that failed since startup.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistence")
            .field("prefix", &self.prefix)
            .field("failures", &self.failures())
            .finish_non_exhaustive()
    }
}

async fn run_writer(
    blobs: Arc<dyn BlobStore>,
    mut rx: mpsc::UnboundedReceiver<Op>,
    failures: Arc<AtomicU64>,
    on_failure: Option<FailureHook>,
) {
    while let Some(op) = rx.recv().await {
        let (key, res) = match op {
            Op::Put { key, bytes } => {
                let res = blobs.put(&key, bytes).await;
                (key, res)
            }
            Op::Delete { key } => {
                let res = blobs.delete(&key).await;
                (key, res)
            }
            Op::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };
        match res {
            Ok(()) => debug!(%key, "collection persisted"),
            Err(e) => {
                warn!(%key, error = %e, "persistence write failed");
                failures.fetch_add(1, Ordering::Relaxed);
                if let Some(hook) = &on_failure {
                    hook(&key);
                }
            }
        }
    }
}
