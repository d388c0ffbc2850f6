//! Button devices bound to a user and/or a task.

use crate::model::RecordId;
use serde::{Deserialize, Serialize};

/// A physical or virtual trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DButton {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Owning user, checked to exist when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
    /// Task the button completes, checked to exist when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<RecordId>,
}

/// Client-side body for creating or updating a button.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDButton {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<RecordId>,
}
