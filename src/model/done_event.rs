//! Completion records.

use crate::model::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped record of a task being marked complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoneEvent {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// The completed task. Always existed when the event was written.
    pub task_id: RecordId,
    /// The task's name when the event was written. Not kept in sync.
    pub task_name: String,
    /// Button the completion came through, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d_button_id: Option<RecordId>,
    /// Server clock at save time.
    pub time: DateTime<Utc>,
}

/// Client-side body for recording a completion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoneEvent {
    pub task_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d_button_id: Option<RecordId>,
}

impl NewDoneEvent {
    /// Completion of `task_id` without a button.
    #[must_use]
    pub fn for_task(task_id: RecordId) -> Self {
        Self {
            task_id,
            d_button_id: None,
        }
    }

    /// Completion of `task_id` through `button_id`.
    #[must_use]
    pub fn via_button(task_id: RecordId, button_id: RecordId) -> Self {
        Self {
            task_id,
            d_button_id: Some(button_id),
        }
    }
}
