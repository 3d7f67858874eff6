//! Task access layer: the only code that knows how tasks are laid out as
//! documents in the store.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::StoreWriteError;
use crate::models::{NewTask, Status, Task, TaskId, TaskRef, UserId};
use crate::store::{Document, DocumentStore, QueryHandle, StoredDocument};

/// Collection holding every task document.
pub const TASKS_COLLECTION: &str = "tasks";

const USER_ID_FIELD: &str = "userId";
const CREATED_AT_FIELD: &str = "createdAt";
const STATUS_FIELD: &str = "status";
const ID_FIELD: &str = "id";

#[derive(Clone)]
pub struct TaskAccess {
    store: Arc<dyn DocumentStore>,
}

impl TaskAccess {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        TaskAccess { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Creates a task owned by `user_id`.
    ///
    /// `userId` and `createdAt` are stamped here and `id` comes from the
    /// store; none of them is ever taken from the payload.
    pub async fn create_task(&self, payload: &NewTask, user_id: &UserId) -> Result<TaskRef, StoreWriteError> {
        let mut fields = match serde_json::to_value(payload)? {
            Value::Object(map) => map,
            _ => return Err(StoreWriteError::Rejected("task payload is not an object".into())),
        };
        fields.remove(ID_FIELD);
        fields.insert(USER_ID_FIELD.into(), Value::String(user_id.0.clone()));
        fields.insert(CREATED_AT_FIELD.into(), Value::String(now_iso8601()));

        let id = self.store.add_document(TASKS_COLLECTION, fields).await?;
        tracing::info!(task_id = %id, user_id = %user_id, "task created");
        Ok(TaskRef { id: TaskId(id) })
    }

    /// Filter selecting every task owned by `user_id`. Nothing is executed
    /// until the handle is subscribed to.
    pub fn tasks_query(&self, user_id: &UserId) -> QueryHandle {
        self.store.query_by_field(TASKS_COLLECTION, USER_ID_FIELD, &user_id.0)
    }

    /// Changes only the `status` field of a task.
    pub async fn update_task_status(&self, task_id: &TaskId, status: Status) -> Result<(), StoreWriteError> {
        let mut partial = Document::new();
        partial.insert(STATUS_FIELD.into(), serde_json::to_value(status)?);
        self.store.update_document(TASKS_COLLECTION, &task_id.0, partial).await?;
        tracing::info!(task_id = %task_id, status = %status, "task status updated");
        Ok(())
    }
}

/// Decodes one stored document into a task. The document key becomes `id`.
pub fn decode_task(doc: StoredDocument) -> Result<Task, serde_json::Error> {
    let mut fields: Map<String, Value> = doc.fields;
    fields.insert(ID_FIELD.into(), Value::String(doc.id));
    serde_json::from_value(Value::Object(fields))
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
