use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_postgres::Row;
use uuid::Uuid;

/// A group of users. Groups form a forest through `parent_group_id`.
#[derive(Clone, Debug, Serialize)]
pub struct Group {
    /// The unique identifier for the group.
    pub id: Uuid,
    /// The name of the group.
    pub name: String,
    /// The ID of the parent group, if any.
    pub parent_group_id: Option<Uuid>,
    /// The IDs of the live groups whose parent is this group.
    pub child_group_ids: Vec<Uuid>,
    /// The timestamp when the group was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the group was last updated.
    pub updated_at: DateTime<Utc>,
    /// The timestamp when the group was deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Row> for Group {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            parent_group_id: row.get("parent_group_id"),
            child_group_ids: row.get("child_group_ids"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        }
    }
}

/// Fields a group update may change.
///
/// `parent_group_id` is doubly optional: `Some(None)` detaches the group.
#[derive(Clone, Debug, Default)]
pub struct GroupChanges {
    pub name: Option<String>,
    pub parent_group_id: Option<Option<Uuid>>,
}
