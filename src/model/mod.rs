//! Record types stored by the tracker.
//!
//! Four independent top-level collections (tasks, buttons, done events,
//! users). Frequencies live embedded inside their task. References between
//! records are weak: an id plus an existence check at write time.

pub mod dbutton;
pub mod done_event;
pub mod id;
pub mod task;
pub mod user;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use dbutton::{DButton, NewDButton};
pub use done_event::{DoneEvent, NewDoneEvent};
pub use id::{InvalidRecordId, RecordId};
pub use task::{Frequency, NewFrequency, NewTask, Task};
pub use user::{NewUser, User};

/// A named collection of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tasks,
    DButtons,
    DoneEvents,
    Users,
}

impl Collection {
    /// Every collection, in schema order.
    pub const ALL: [Collection; 4] = [
        Collection::Tasks,
        Collection::DButtons,
        Collection::DoneEvents,
        Collection::Users,
    ];

    /// Backing table name.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::DButtons => "dbuttons",
            Self::DoneEvents => "done_events",
            Self::Users => "users",
        }
    }

    /// Model name used in error messages.
    #[must_use]
    pub fn model_name(self) -> &'static str {
        match self {
            Self::Tasks => "Task",
            Self::DButtons => "DButton",
            Self::DoneEvents => "DoneEvent",
            Self::Users => "User",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// A record that lives in exactly one collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection this record is stored in.
    const COLLECTION: Collection;

    /// The record's id.
    fn id(&self) -> &RecordId;
}

impl Document for Task {
    const COLLECTION: Collection = Collection::Tasks;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Document for DButton {
    const COLLECTION: Collection = Collection::DButtons;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Document for DoneEvent {
    const COLLECTION: Collection = Collection::DoneEvents;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_names_are_distinct() {
        let tables: HashSet<&str> = Collection::ALL.iter().map(|c| c.table()).collect();
        assert_eq!(tables.len(), Collection::ALL.len());
    }

    #[test]
    fn documents_report_their_collection() {
        assert_eq!(Task::COLLECTION, Collection::Tasks);
        assert_eq!(DButton::COLLECTION, Collection::DButtons);
        assert_eq!(DoneEvent::COLLECTION, Collection::DoneEvents);
        assert_eq!(User::COLLECTION.model_name(), "User");
    }
}
