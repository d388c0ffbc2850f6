//! Persistence for tasks, buttons, done events and users.
//!
//! [`SqliteStore`] is the only backend. Validation code does not talk to it
//! directly; it goes through the [`RecordLookup`] capability so the checks
//! can be exercised against an in-memory stand-in.

pub mod schema;
pub mod sqlite;

use async_trait::async_trait;

use crate::model::{Collection, RecordId, Task};

pub use sqlite::{SqliteStore, StoreError};

/// Read-only access needed by referential validation.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// Whether `id` names a record in `collection`.
    async fn exists(&self, collection: Collection, id: &RecordId) -> Result<bool, StoreError>;

    /// Fetch a task, used to snapshot its name onto a done event.
    async fn fetch_task(&self, id: &RecordId) -> Result<Option<Task>, StoreError>;
}

#[async_trait]
impl RecordLookup for SqliteStore {
    async fn exists(&self, collection: Collection, id: &RecordId) -> Result<bool, StoreError> {
        SqliteStore::exists(self, collection, id)
    }

    async fn fetch_task(&self, id: &RecordId) -> Result<Option<Task>, StoreError> {
        self.get::<Task>(id)
    }
}
