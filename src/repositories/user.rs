use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::StoreResult,
    models::user::{User, UserChanges},
};

/// Persistence contract for principals.
///
/// Every lookup ignores soft-deleted rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a live user by their email address.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Finds a live user by their ID.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Inserts a new user. Fails with `StoreError::Conflict` if the email is taken.
    async fn insert(&self, email: &str, name: Option<&str>, password_hash: &str) -> StoreResult<User>;

    /// Lists all live users, oldest first.
    async fn list(&self) -> StoreResult<Vec<User>>;

    /// Applies `changes` to a live user. Returns `None` if there is no such user.
    async fn update(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>>;

    /// Marks a user as deleted. Returns `false` if there was no live user to delete.
    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool>;
}

const SELECT_USER: &str = r#"
    SELECT
        u.id, u.email, u.name, u.password_hash, u.created_at, u.updated_at, u.deleted_at,
        ARRAY(SELECT ur.role_id FROM user_roles ur WHERE ur.user_id = u.id ORDER BY ur.role_id) AS role_ids,
        ARRAY(SELECT ug.group_id FROM user_groups ug WHERE ug.user_id = u.id ORDER BY ug.group_id) AS group_ids
    FROM users u
"#;

/// `UserRepository` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    /// Creates a new `PgUserRepository`.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("{SELECT_USER} WHERE u.email = $1 AND u.deleted_at IS NULL"),
                &[&email],
            )
            .await?;
        Ok(row.as_ref().map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("{SELECT_USER} WHERE u.id = $1 AND u.deleted_at IS NULL"),
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(User::from))
    }

    async fn insert(&self, email: &str, name: Option<&str>, password_hash: &str) -> StoreResult<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO users (id, email, name, password_hash)
                VALUES ($1, $2, $3, $4)
                RETURNING id, email, name, password_hash, created_at, updated_at, deleted_at,
                          '{}'::uuid[] AS role_ids, '{}'::uuid[] AS group_ids
                "#,
                &[&Uuid::new_v4(), &email, &name, &password_hash],
            )
            .await?;
        Ok(User::from(&row))
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!("{SELECT_USER} WHERE u.deleted_at IS NULL ORDER BY u.created_at, u.id"),
                &[],
            )
            .await?;
        Ok(rows.iter().map(User::from).collect())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let updated = tx
            .execute(
                r#"
                UPDATE users
                SET
                    email = COALESCE($2, email),
                    name = COALESCE($3, name),
                    password_hash = COALESCE($4, password_hash),
                    updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                "#,
                &[&id, &changes.email, &changes.name, &changes.password_hash],
            )
            .await?;

        if updated == 0 {
            return Ok(None);
        }

        if let Some(role_ids) = &changes.role_ids {
            tx.execute("DELETE FROM user_roles WHERE user_id = $1", &[&id])
                .await?;
            tx.execute(
                "INSERT INTO user_roles (user_id, role_id) SELECT $1, unnest($2::uuid[])",
                &[&id, role_ids],
            )
            .await?;
        }

        if let Some(group_ids) = &changes.group_ids {
            tx.execute("DELETE FROM user_groups WHERE user_id = $1", &[&id])
                .await?;
            tx.execute(
                "INSERT INTO user_groups (user_id, group_id) SELECT $1, unnest($2::uuid[])",
                &[&id, group_ids],
            )
            .await?;
        }

        let row = tx
            .query_one(&format!("{SELECT_USER} WHERE u.id = $1"), &[&id])
            .await?;
        tx.commit().await?;

        Ok(Some(User::from(&row)))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute(
                r#"
                UPDATE users
                SET deleted_at = NOW(), updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                "#,
                &[&id],
            )
            .await?;
        Ok(deleted > 0)
    }
}
