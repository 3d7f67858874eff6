//! Document store contract.
//!
//! The task access layer and the live subscription only talk to the store
//! through [`DocumentStore`], so the dashboard can run against the local JSON
//! store or a test double.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::{StoreWriteError, SubscriptionError};

/// Field set of a stored document, without its id.
pub type Document = Map<String, Value>;

/// A document as returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

/// Equality filter over one field of a collection. Building one does not
/// touch the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHandle {
    pub collection: String,
    pub field: String,
    pub value: String,
}

impl QueryHandle {
    /// Whether a document's fields satisfy this filter.
    pub fn matches(&self, fields: &Document) -> bool {
        fields.get(&self.field).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

/// Each item is the full result set of a query at one point in time.
pub type SnapshotStream = mpsc::Receiver<Result<Vec<StoredDocument>, SubscriptionError>>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns its store-assigned id.
    async fn add_document(&self, collection: &str, fields: Document) -> Result<String, StoreWriteError>;

    /// Builds a filter selecting documents whose `field` equals `value`.
    fn query_by_field(&self, collection: &str, field: &str, value: &str) -> QueryHandle {
        QueryHandle {
            collection: collection.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Merges `partial` into an existing document. Fails with
    /// [`StoreWriteError::NotFound`] if `id` does not exist.
    async fn update_document(&self, collection: &str, id: &str, partial: Document) -> Result<(), StoreWriteError>;

    /// Opens a live query. The first item is the current result set; another
    /// follows after every change to the store. Dropping the receiver ends
    /// the subscription.
    async fn subscribe(&self, query: &QueryHandle) -> Result<SnapshotStream, SubscriptionError>;
}
