use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Default, Deserialize, Clone, ToSchema)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}
