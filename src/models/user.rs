use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_postgres::Row;
use uuid::Uuid;

/// An account that can authenticate. Also the principal attached to guarded requests.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// The unique identifier for the user. Never reused.
    pub id: Uuid,
    /// The user's email address, case-sensitive as stored.
    pub email: String,
    /// The user's display name.
    pub name: Option<String>,
    /// The Argon2id PHC string of the user's password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// The roles the user holds.
    pub role_ids: Vec<Uuid>,
    /// The groups the user belongs to.
    pub group_ids: Vec<Uuid>,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Deleted users never resolve.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Row> for User {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            password_hash: row.get("password_hash"),
            role_ids: row.get("role_ids"),
            group_ids: row.get("group_ids"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        }
    }
}

/// Fields a user update may change. `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role_ids: Option<Vec<Uuid>>,
    pub group_ids: Option<Vec<Uuid>>,
}
