use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::error::{StoreOpenError, StoreWriteError, SubscriptionError};
use crate::store::{Document, DocumentStore, QueryHandle, SnapshotStream, StoredDocument};

/// Snapshots buffered per subscription before the producer waits.
const SNAPSHOT_BUFFER: usize = 16;

/// collection name -> document id -> fields
type Collections = BTreeMap<String, BTreeMap<String, Document>>;

struct Shared {
    collections: Mutex<Collections>,
    /// Bumped after every committed write.
    changes: watch::Sender<u64>,
    path: Option<PathBuf>,
}

impl Shared {
    fn query(&self, query: &QueryHandle) -> Vec<StoredDocument> {
        let collections = self.collections.lock();
        collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .map(|(id, fields)| StoredDocument { id: id.clone(), fields: fields.clone() })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Applies `mutate` to a copy of the collections, persists the copy and
    /// only then makes it current. A failed write leaves the store untouched.
    ///
    /// The file is rewritten while the lock is held, so writes are applied
    /// one at a time and the calling runtime thread blocks for the duration
    /// of the write.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut Collections) -> Result<T, StoreWriteError>,
    ) -> Result<T, StoreWriteError> {
        let mut current = self.collections.lock();
        let mut next = current.clone();
        let out = mutate(&mut next)?;
        if let Some(path) = &self.path {
            save_collections(path, &next)?;
        }
        *current = next;
        drop(current);
        self.changes.send_modify(|rev| *rev += 1);
        Ok(out)
    }
}

/// In-process document store, optionally persisted to a JSON file.
///
/// Every write rewrites the whole file. Live queries are re-evaluated after
/// each committed write and pushed to their subscribers.
#[derive(Clone)]
pub struct LocalStore {
    shared: Arc<Shared>,
}

impl LocalStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::with_state(Collections::new(), None)
    }

    /// Opens the store backed by `path`.
    ///
    /// A missing file is an empty store; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreOpenError> {
        let path = path.into();
        let collections = load_collections(&path)?;
        Ok(Self::with_state(collections, Some(path)))
    }

    fn with_state(collections: Collections, path: Option<PathBuf>) -> Self {
        let (changes, _) = watch::channel(0);
        LocalStore {
            shared: Arc::new(Shared {
                collections: Mutex::new(collections),
                changes,
                path,
            }),
        }
    }

    /// Number of live queries currently attached to the store.
    pub fn subscriber_count(&self) -> usize {
        self.shared.changes.receiver_count()
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.shared.path.as_deref()
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn add_document(&self, collection: &str, fields: Document) -> Result<String, StoreWriteError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.shared.commit(|collections| {
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), fields);
            Ok(())
        })?;
        tracing::debug!(collection, id = %id, "document added");
        Ok(id)
    }

    async fn update_document(&self, collection: &str, id: &str, partial: Document) -> Result<(), StoreWriteError> {
        self.shared.commit(|collections| {
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreWriteError::NotFound(id.to_string()))?;
            doc.extend(partial);
            Ok(())
        })?;
        tracing::debug!(collection, id, "document updated");
        Ok(())
    }

    async fn subscribe(&self, query: &QueryHandle) -> Result<SnapshotStream, SubscriptionError> {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let mut changes = self.shared.changes.subscribe();
        let shared = Arc::clone(&self.shared);
        let query = query.clone();

        tokio::spawn(async move {
            loop {
                // Mark the current revision as seen before reading, so a write
                // landing after the read still wakes us up.
                changes.borrow_and_update();
                let snapshot = shared.query(&query);
                if tx.send(Ok(snapshot)).await.is_err() {
                    break;
                }
                tokio::select! {
                    _ = tx.closed() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            let _ = tx.send(Err(SubscriptionError::Closed)).await;
                            break;
                        }
                    }
                }
            }
            tracing::debug!(collection = %query.collection, field = %query.field, "live query ended");
        });

        Ok(rx)
    }
}

/// Loads all collections from the storage file.
fn load_collections(path: &Path) -> Result<Collections, StoreOpenError> {
    if !path.exists() {
        return Ok(Collections::new());
    }
    let read_err = |source| StoreOpenError::Read { path: path.display().to_string(), source };
    let mut f = OpenOptions::new().read(true).open(path).map_err(read_err)?;
    let mut s = String::new();
    f.read_to_string(&mut s).map_err(read_err)?;
    if s.trim().is_empty() {
        return Ok(Collections::new());
    }
    serde_json::from_str(&s).map_err(|source| StoreOpenError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Saves all collections to the storage file, overwriting it.
fn save_collections(path: &Path, collections: &Collections) -> Result<(), StoreWriteError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let s = serde_json::to_string_pretty(collections)?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
