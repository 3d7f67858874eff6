use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StatusError;

/// Format used for due dates, both on input and in stored documents.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Store-assigned identifier of a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(pub String);

/// Identifier of the user owning a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// Progress state of a task. Any status may follow any other.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Pending,
    Incomplete,
    Completed,
}

impl Status {
    /// Every status, in the order the dashboard offers them.
    pub const ALL: [Status; 3] = [Status::Pending, Status::Incomplete, Status::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Incomplete => "Incomplete",
            Status::Completed => "Completed",
        }
    }

    /// The status after this one, wrapping around.
    pub fn next(self) -> Status {
        match self {
            Status::Pending => Status::Incomplete,
            Status::Incomplete => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = StatusError;

    /// Accepts the three status names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StatusError::Unknown(s.to_string()))
    }
}

/// A single task as stored and delivered by a live subscription.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier assigned by the store.
    pub id: TaskId,
    /// Short label for the work.
    pub name: String,
    /// Who the task is being done for.
    pub stakeholder: String,
    /// Due date as an ISO 8601 date string.
    pub due_date: String,
    #[serde(default)]
    pub status: Status,
    /// Owner of the task; never changes after creation.
    pub user_id: UserId,
    /// Timestamp when the task was created (RFC 3339).
    pub created_at: String,
}

impl Task {
    /// Parses the due date for display. `None` if the stored text is not a date.
    pub fn due(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.due_date, DUE_DATE_FORMAT).ok()
    }

    /// Human label for the time left until the due date, relative to `today`.
    pub fn due_label(&self, today: NaiveDate) -> String {
        match self.due() {
            Some(due) => {
                let days_left = (due - today).num_days();
                if days_left < 0 {
                    format!("{}d overdue", days_left.abs())
                } else if days_left == 0 {
                    "Today".to_string()
                } else {
                    format!("{}d", days_left)
                }
            }
            None => self.due_date.clone(),
        }
    }
}

/// Creation payload: a task without the fields the system assigns
/// (`id`, `userId`, `createdAt`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    pub stakeholder: String,
    pub due_date: String,
    #[serde(default)]
    pub status: Status,
}

/// Reference to a freshly created task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRef {
    pub id: TaskId,
}
