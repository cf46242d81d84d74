use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::StoreResult,
    models::group::{Group, GroupChanges},
};

/// Persistence contract for groups.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>>;
    async fn insert(&self, name: &str, parent_group_id: Option<Uuid>) -> StoreResult<Group>;
    async fn list(&self) -> StoreResult<Vec<Group>>;
    async fn update(&self, id: Uuid, changes: GroupChanges) -> StoreResult<Option<Group>>;
    /// Marks a group as deleted, detaches its children and drops its memberships.
    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool>;
}

const SELECT_GROUP: &str = r#"
    SELECT
        g.id, g.name, g.parent_group_id, g.created_at, g.updated_at, g.deleted_at,
        ARRAY(
            SELECT c.id FROM groups c
            WHERE c.parent_group_id = g.id AND c.deleted_at IS NULL
            ORDER BY c.created_at, c.id
        ) AS child_group_ids
    FROM groups g
"#;

/// `GroupRepository` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgGroupRepository {
    pool: Pool,
}

impl PgGroupRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("{SELECT_GROUP} WHERE g.id = $1 AND g.deleted_at IS NULL"),
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(Group::from))
    }

    async fn insert(&self, name: &str, parent_group_id: Option<Uuid>) -> StoreResult<Group> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO groups (id, name, parent_group_id)
                VALUES ($1, $2, $3)
                RETURNING id, name, parent_group_id, created_at, updated_at, deleted_at,
                          '{}'::uuid[] AS child_group_ids
                "#,
                &[&Uuid::new_v4(), &name, &parent_group_id],
            )
            .await?;
        Ok(Group::from(&row))
    }

    async fn list(&self) -> StoreResult<Vec<Group>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!("{SELECT_GROUP} WHERE g.deleted_at IS NULL ORDER BY g.created_at, g.id"),
                &[],
            )
            .await?;
        Ok(rows.iter().map(Group::from).collect())
    }

    async fn update(&self, id: Uuid, changes: GroupChanges) -> StoreResult<Option<Group>> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let set_parent = changes.parent_group_id.is_some();
        let parent = changes.parent_group_id.flatten();

        let updated = tx
            .execute(
                r#"
                UPDATE groups
                SET
                    name = COALESCE($2, name),
                    parent_group_id = CASE WHEN $3 THEN $4 ELSE parent_group_id END,
                    updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                "#,
                &[&id, &changes.name, &set_parent, &parent],
            )
            .await?;

        if updated == 0 {
            return Ok(None);
        }

        let row = tx
            .query_one(&format!("{SELECT_GROUP} WHERE g.id = $1"), &[&id])
            .await?;
        tx.commit().await?;

        Ok(Some(Group::from(&row)))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let deleted = tx
            .execute(
                "UPDATE groups SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
                &[&id],
            )
            .await?;

        if deleted == 0 {
            return Ok(false);
        }

        tx.execute(
            "UPDATE groups SET parent_group_id = NULL, updated_at = NOW() WHERE parent_group_id = $1",
            &[&id],
        )
        .await?;
        tx.execute("DELETE FROM user_groups WHERE group_id = $1", &[&id])
            .await?;
        tx.commit().await?;

        Ok(true)
    }
}
