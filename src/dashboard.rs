//! Dashboard controller.
//!
//! Owns the task list shown to the user, the new-task form and the single
//! live subscription. All state changes happen on the caller's event loop:
//! subscription callbacks only post [`DashboardEvent`]s, which the loop hands
//! back through [`Dashboard::apply`].

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;

use crate::access::TaskAccess;
use crate::error::{FormError, SubscriptionError};
use crate::models::{NewTask, Status, Task, TaskId, UserId, DUE_DATE_FORMAT};
use crate::notify::Notifier;
use crate::progress::completion_percentage;
use crate::session::{AuthProvider, Session};
use crate::subscription::{self, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Unauthenticated entry view.
    SignIn,
    Tasks,
}

/// Input state of the "new task" form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskForm {
    pub name: String,
    pub stakeholder: String,
    pub due_date: String,
    pub status: Status,
}

impl TaskForm {
    /// Checks required fields and builds the creation payload.
    pub fn validate(&self) -> Result<NewTask, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::Missing("name"));
        }
        let stakeholder = self.stakeholder.trim();
        if stakeholder.is_empty() {
            return Err(FormError::Missing("stakeholder"));
        }
        let due_date = self.due_date.trim();
        if due_date.is_empty() {
            return Err(FormError::Missing("due date"));
        }
        if NaiveDate::parse_from_str(due_date, DUE_DATE_FORMAT).is_err() {
            return Err(FormError::InvalidDueDate(due_date.to_string()));
        }
        Ok(NewTask {
            name: name.to_string(),
            stakeholder: stakeholder.to_string(),
            due_date: due_date.to_string(),
            status: self.status,
        })
    }
}

/// Something the live subscription delivered. `generation` identifies the
/// subscription it came from.
#[derive(Debug)]
pub enum DashboardEvent {
    Snapshot { generation: u64, tasks: Vec<Task> },
    SubscriptionFailed { generation: u64, error: SubscriptionError },
}

/// Receiving end of the dashboard's event queue.
pub struct DashboardEvents {
    rx: mpsc::UnboundedReceiver<DashboardEvent>,
}

impl DashboardEvents {
    /// Waits for the next event.
    pub async fn recv(&mut self) -> Option<DashboardEvent> {
        self.rx.recv().await
    }

    /// Returns a queued event without waiting.
    pub fn try_recv(&mut self) -> Option<DashboardEvent> {
        self.rx.try_recv().ok()
    }
}

pub struct Dashboard {
    access: TaskAccess,
    auth: Arc<dyn AuthProvider>,
    notifier: Arc<dyn Notifier>,
    session: Session,
    tasks: Vec<Task>,
    pub form: TaskForm,
    view: View,
    subscription: Option<Subscription>,
    /// Bumped whenever the subscription is replaced or released; events
    /// tagged with an older value are stale.
    generation: u64,
    events: mpsc::UnboundedSender<DashboardEvent>,
}

impl Dashboard {
    /// Creates a dashboard with no user yet. Feed it sessions with
    /// [`Dashboard::set_session`] and events from the returned queue with
    /// [`Dashboard::apply`].
    pub fn new(
        access: TaskAccess,
        auth: Arc<dyn AuthProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> (Dashboard, DashboardEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dashboard = Dashboard {
            access,
            auth,
            notifier,
            session: Session::loading(),
            tasks: Vec::new(),
            form: TaskForm::default(),
            view: View::SignIn,
            subscription: None,
            generation: 0,
            events: tx,
        };
        (dashboard, DashboardEvents { rx })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Tag carried by events of the current subscription.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_active_subscription(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// Recomputed from the current list on every call.
    pub fn completion_percentage(&self) -> u8 {
        completion_percentage(&self.tasks)
    }

    /// Reacts to the authentication state.
    ///
    /// When the signed-in user changes, the previous subscription is
    /// cancelled and the list cleared before subscribing for the new user.
    /// Without a user nothing is subscribed and the list stays empty.
    pub async fn set_session(&mut self, session: Session) {
        let next_uid = session.current_user().map(|u| u.uid.clone());
        let current_uid = self.session.current_user().map(|u| u.uid.clone());
        let unchanged = next_uid == current_uid && (next_uid.is_none() || self.has_active_subscription());
        self.session = session;
        if unchanged {
            return;
        }

        self.release_subscription();
        self.tasks.clear();
        match next_uid {
            Some(uid) => {
                self.view = View::Tasks;
                self.start_subscription(uid).await;
            }
            None => {
                tracing::debug!("no signed-in user; dashboard idle");
                self.view = View::SignIn;
            }
        }
    }

    async fn start_subscription(&mut self, uid: UserId) {
        self.generation += 1;
        let generation = self.generation;
        let query = self.access.tasks_query(&uid);
        let snapshots = self.events.clone();
        let failures = self.events.clone();

        let sub = subscription::subscribe(
            &self.access,
            query,
            move |tasks| {
                let _ = snapshots.send(DashboardEvent::Snapshot { generation, tasks });
            },
            move |error| {
                let _ = failures.send(DashboardEvent::SubscriptionFailed { generation, error });
            },
        )
        .await;
        tracing::info!(uid = %uid, generation, "watching tasks");
        self.subscription = Some(sub);
    }

    fn release_subscription(&mut self) {
        if let Some(mut sub) = self.subscription.take() {
            sub.unsubscribe();
        }
        self.generation += 1;
    }

    /// Applies one event from the subscription. Snapshots replace the list
    /// wholesale; events from a cancelled subscription are dropped.
    pub fn apply(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Snapshot { generation, tasks } if generation == self.generation => {
                tracing::debug!(count = tasks.len(), "snapshot applied");
                self.tasks = tasks;
            }
            DashboardEvent::SubscriptionFailed { generation, error } if generation == self.generation => {
                self.release_subscription();
                self.notifier.failure(&format!("Live updates stopped: {}", error));
            }
            _ => tracing::debug!("dropping event from a cancelled subscription"),
        }
    }

    /// Applies every event already queued, without waiting. Returns how many
    /// were handled.
    pub fn sync(&mut self, events: &mut DashboardEvents) -> usize {
        let mut n = 0;
        while let Some(event) = events.try_recv() {
            self.apply(event);
            n += 1;
        }
        n
    }

    /// Creates a task from the form.
    ///
    /// On success the form is reset. On failure the form is left exactly as
    /// it was. The list itself only changes through the next snapshot.
    pub async fn submit(&mut self) -> bool {
        let Some(user) = self.session.current_user().cloned() else {
            self.notifier.failure("Sign in to add tasks");
            return false;
        };
        let payload = match self.form.validate() {
            Ok(payload) => payload,
            Err(e) => {
                self.notifier.failure(&e.to_string());
                return false;
            }
        };
        match self.access.create_task(&payload, &user.uid).await {
            Ok(_) => {
                self.form = TaskForm::default();
                self.notifier.success("Task added successfully");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "create task failed");
                self.notifier.failure(&format!("Failed to add task: {}", e));
                false
            }
        }
    }

    /// Updates a task's status right away. The list reflects the change once
    /// the next snapshot arrives.
    pub async fn change_status(&mut self, task_id: &TaskId, status: Status) -> bool {
        match self.access.update_task_status(task_id, status).await {
            Ok(()) => {
                self.notifier.success("Task status updated");
                true
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "status update failed");
                self.notifier.failure(&format!("Failed to update task status: {}", e));
                false
            }
        }
    }

    /// Status change from raw input. Text that is not a known status is
    /// rejected here and never reaches the store.
    pub async fn select_status(&mut self, task_id: &TaskId, raw: &str) -> bool {
        match raw.parse::<Status>() {
            Ok(status) => self.change_status(task_id, status).await,
            Err(e) => {
                self.notifier.failure(&e.to_string());
                false
            }
        }
    }

    /// Signs out and returns to the sign-in view. On failure nothing changes
    /// and the user stays on the current view.
    pub async fn sign_out(&mut self) -> bool {
        match self.auth.sign_out().await {
            Ok(()) => {
                self.release_subscription();
                self.tasks.clear();
                self.session = Session::signed_out();
                self.view = View::SignIn;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "sign-out failed");
                self.notifier.failure(&format!("Failed to sign out: {}", e));
                false
            }
        }
    }
}
