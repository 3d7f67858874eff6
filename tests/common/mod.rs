#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use taskboard::access::TaskAccess;
use taskboard::dashboard::{Dashboard, DashboardEvents};
use taskboard::error::{SignOutError, StoreWriteError, SubscriptionError};
use taskboard::models::NewTask;
use taskboard::notify::{NoticeKind, Notifier};
use taskboard::session::{AuthProvider, Session, User};
use taskboard::storage::LocalStore;
use taskboard::store::{Document, DocumentStore, QueryHandle, SnapshotStream};

pub const WAIT: Duration = Duration::from_secs(2);

/// Notifier that remembers everything it was told.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<String> {
        self.of(NoticeKind::Success)
    }

    pub fn failures(&self) -> Vec<String> {
        self.of(NoticeKind::Failure)
    }

    fn of(&self, kind: NoticeKind) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.notices.lock().push((NoticeKind::Success, message.to_string()));
    }

    fn failure(&self, message: &str) {
        self.notices.lock().push((NoticeKind::Failure, message.to_string()));
    }
}

/// Wraps a [`LocalStore`] and can be told to fail writes or subscriptions.
pub struct FlakyStore {
    pub inner: LocalStore,
    pub fail_writes: AtomicBool,
    pub fail_subscribe: AtomicBool,
    pub write_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        FlakyStore {
            inner: LocalStore::in_memory(),
            fail_writes: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            write_calls: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn write_guard(&self) -> Result<(), StoreWriteError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreWriteError::Rejected("permission denied".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn add_document(&self, collection: &str, fields: Document) -> Result<String, StoreWriteError> {
        self.write_guard()?;
        self.inner.add_document(collection, fields).await
    }

    async fn update_document(&self, collection: &str, id: &str, partial: Document) -> Result<(), StoreWriteError> {
        self.write_guard()?;
        self.inner.update_document(collection, id, partial).await
    }

    async fn subscribe(&self, query: &QueryHandle) -> Result<SnapshotStream, SubscriptionError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(SubscriptionError::Denied("missing permissions".into()));
        }
        self.inner.subscribe(query).await
    }
}

/// Auth provider driven by the test.
pub struct ScriptedAuth {
    state: watch::Sender<Session>,
    pub fail_sign_out: AtomicBool,
    pub sign_out_calls: AtomicUsize,
}

impl ScriptedAuth {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session::loading());
        ScriptedAuth {
            state,
            fail_sign_out: AtomicBool::new(false),
            sign_out_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuthProvider for ScriptedAuth {
    fn session(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    async fn sign_out(&self) -> Result<(), SignOutError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(SignOutError("network unreachable".into()));
        }
        self.state.send_replace(Session::signed_out());
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub auth: Arc<ScriptedAuth>,
    pub notifier: Arc<RecordingNotifier>,
    pub access: TaskAccess,
    pub dashboard: Dashboard,
    pub events: DashboardEvents,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(FlakyStore::new());
        let auth = Arc::new(ScriptedAuth::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let access = TaskAccess::new(store.clone());
        let (dashboard, events) = Dashboard::new(access.clone(), auth.clone(), notifier.clone());
        Harness { store, auth, notifier, access, dashboard, events }
    }

    /// Signs `uid` in and waits for the first snapshot.
    pub async fn sign_in(&mut self, uid: &str) {
        let user = User::new(uid, format!("{}@example.com", uid));
        self.dashboard.set_session(Session::signed_in(user)).await;
        self.next_snapshot().await;
    }

    /// Applies events until one has been delivered, failing the test after
    /// [`WAIT`].
    pub async fn next_snapshot(&mut self) {
        let event = tokio::time::timeout(WAIT, self.events.recv())
            .await
            .expect("timed out waiting for a snapshot")
            .expect("event queue closed");
        self.dashboard.apply(event);
    }

    /// Applies events until `done` holds for the dashboard.
    pub async fn wait_until(&mut self, done: impl Fn(&Dashboard) -> bool) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while !done(&self.dashboard) {
            let event = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .expect("condition not reached in time")
                .expect("event queue closed");
            self.dashboard.apply(event);
        }
    }

    /// Lets background tasks run, then applies whatever they queued.
    pub async fn settle(&mut self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.dashboard.sync(&mut self.events);
    }
}

/// Polls until the store has exactly `n` live queries.
pub async fn wait_for_subscribers(store: &LocalStore, n: usize) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while store.subscriber_count() != n {
        assert!(
            tokio::time::Instant::now() < deadline,
            "expected {} live queries, found {}",
            n,
            store.subscriber_count()
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn new_task(name: &str, stakeholder: &str, due: &str) -> NewTask {
    NewTask {
        name: name.into(),
        stakeholder: stakeholder.into(),
        due_date: due.into(),
        status: Default::default(),
    }
}
