//! Live subscription to a task query.
//!
//! A background task forwards the store's snapshot stream to a callback.
//! Every delivery is the complete list of matching tasks, never a delta.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::access::{decode_task, TaskAccess};
use crate::error::SubscriptionError;
use crate::models::Task;
use crate::store::{QueryHandle, StoredDocument};

/// Handle to a running live query. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
    /// Set once delivery has stopped. The forwarding task holds this lock
    /// while it calls a callback.
    cancelled: Arc<Mutex<bool>>,
}

impl Subscription {
    fn inactive() -> Self {
        Subscription {
            task: None,
            cancelled: Arc::new(Mutex::new(true)),
        }
    }

    /// Stops delivery. Safe to call any number of times; once it returns,
    /// neither callback is invoked again. A callback already running on
    /// another thread is waited for.
    pub fn unsubscribe(&mut self) {
        *self.cancelled.lock() = true;
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("subscription cancelled");
        }
    }

    /// Whether snapshots may still be delivered.
    pub fn is_active(&self) -> bool {
        !*self.cancelled.lock() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Subscribes to `query` and calls `on_snapshot` with the full task list on
/// the initial load and after every change.
///
/// If the store refuses the query, or the stream fails later, `on_error` is
/// called once and no further snapshots are delivered.
pub async fn subscribe<S, E>(access: &TaskAccess, query: QueryHandle, mut on_snapshot: S, on_error: E) -> Subscription
where
    S: FnMut(Vec<Task>) + Send + 'static,
    E: FnOnce(SubscriptionError) + Send + 'static,
{
    let mut stream = match access.store().subscribe(&query).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(error = %e, field = %query.field, value = %query.value, "subscribe refused");
            on_error(e);
            return Subscription::inactive();
        }
    };

    let cancelled = Arc::new(Mutex::new(false));
    let gate = Arc::clone(&cancelled);
    let task = tokio::spawn(async move {
        while let Some(item) = stream.recv().await {
            let tasks = match item {
                Ok(docs) => decode_snapshot(docs),
                Err(e) => {
                    tracing::warn!(error = %e, "live query failed");
                    let mut stopped = gate.lock();
                    if !*stopped {
                        *stopped = true;
                        on_error(e);
                    }
                    return;
                }
            };
            let stopped = gate.lock();
            if *stopped {
                return;
            }
            on_snapshot(tasks);
        }
        let mut stopped = gate.lock();
        if !*stopped {
            *stopped = true;
            on_error(SubscriptionError::Closed);
        }
    });

    tracing::debug!(field = %query.field, value = %query.value, "subscribed");
    Subscription {
        task: Some(task),
        cancelled,
    }
}

fn decode_snapshot(docs: Vec<StoredDocument>) -> Vec<Task> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match decode_task(doc) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping malformed task document");
                    None
                }
            }
        })
        .collect()
}
