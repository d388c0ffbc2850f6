//! Users that buttons can be bound to.

use crate::model::RecordId;
use serde::{Deserialize, Serialize};

/// An account a [`DButton`](crate::model::DButton) may belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Client-side body for creating a user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewUser {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
