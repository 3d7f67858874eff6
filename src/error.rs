//! Error types for taskboard.
//!
//! Every failure is caught at the user action that triggered it and turned
//! into a notification; none of these crash the dashboard.

/// A create or update against the document store failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreWriteError {
    /// The target document does not exist.
    #[error("task {0} not found")]
    NotFound(String),

    /// The store refused the write (permissions, validation).
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The fields could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing file could not be written.
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A live query failed to deliver. No further snapshots arrive until the
/// caller subscribes again.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubscriptionError {
    #[error("subscription denied: {0}")]
    Denied(String),

    #[error("subscription closed by the store")]
    Closed,
}

/// The authentication collaborator could not sign the user out.
#[derive(Debug, thiserror::Error)]
#[error("sign-out failed: {0}")]
pub struct SignOutError(pub String);

/// A status value outside the known set reached the input boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatusError {
    #[error("unknown status '{0}' (expected Pending, Incomplete or Completed)")]
    Unknown(String),
}

/// The new-task form failed required-field checks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid due date '{0}', use YYYY-MM-DD")]
    InvalidDueDate(String),
}

/// Failure opening the local document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreOpenError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
