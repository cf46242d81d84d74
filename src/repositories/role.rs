use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::StoreResult,
    models::role::{Role, RoleChanges},
};

/// Persistence contract for roles.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Role>>;
    async fn insert(&self, name: &str, description: Option<&str>) -> StoreResult<Role>;
    async fn list(&self) -> StoreResult<Vec<Role>>;
    async fn update(&self, id: Uuid, changes: RoleChanges) -> StoreResult<Option<Role>>;
    /// Marks a role as deleted and strips it from every user.
    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool>;
}

const ROLE_COLUMNS: &str = "id, name, description, created_at, updated_at, deleted_at";

/// `RoleRepository` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgRoleRepository {
    pool: Pool,
}

impl PgRoleRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Role>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 AND deleted_at IS NULL"),
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(Role::from))
    }

    async fn insert(&self, name: &str, description: Option<&str>) -> StoreResult<Role> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                &format!(
                    "INSERT INTO roles (id, name, description) VALUES ($1, $2, $3) RETURNING {ROLE_COLUMNS}"
                ),
                &[&Uuid::new_v4(), &name, &description],
            )
            .await?;
        Ok(Role::from(&row))
    }

    async fn list(&self) -> StoreResult<Vec<Role>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    "SELECT {ROLE_COLUMNS} FROM roles WHERE deleted_at IS NULL ORDER BY created_at, id"
                ),
                &[],
            )
            .await?;
        Ok(rows.iter().map(Role::from).collect())
    }

    async fn update(&self, id: Uuid, changes: RoleChanges) -> StoreResult<Option<Role>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!(
                    r#"
                    UPDATE roles
                    SET
                        name = COALESCE($2, name),
                        description = COALESCE($3, description),
                        updated_at = NOW()
                    WHERE id = $1 AND deleted_at IS NULL
                    RETURNING {ROLE_COLUMNS}
                    "#
                ),
                &[&id, &changes.name, &changes.description],
            )
            .await?;
        Ok(row.as_ref().map(Role::from))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let deleted = tx
            .execute(
                "UPDATE roles SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
                &[&id],
            )
            .await?;

        if deleted == 0 {
            return Ok(false);
        }

        tx.execute("DELETE FROM user_roles WHERE role_id = $1", &[&id])
            .await?;
        tx.commit().await?;

        Ok(true)
    }
}
