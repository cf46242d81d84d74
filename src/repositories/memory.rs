use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{StoreError, StoreResult},
    models::{
        group::{Group, GroupChanges},
        role::{Role, RoleChanges},
        user::{User, UserChanges},
    },
    repositories::{group::GroupRepository, role::RoleRepository, user::UserRepository},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    groups: HashMap<Uuid, Group>,
}

impl Tables {
    fn live_user_with_email(&self, email: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.deleted_at.is_none() && u.email == email)
    }

    fn live_role_with_name(&self, name: &str) -> Option<&Role> {
        self.roles
            .values()
            .find(|r| r.deleted_at.is_none() && r.name == name)
    }

    fn group_with_children(&self, group: &Group) -> Group {
        let mut children: Vec<&Group> = self
            .groups
            .values()
            .filter(|c| c.deleted_at.is_none() && c.parent_group_id == Some(group.id))
            .collect();
        children.sort_by_key(|c| (c.created_at, c.id));

        Group {
            child_group_ids: children.into_iter().map(|c| c.id).collect(),
            ..group.clone()
        }
    }
}

/// Process-local store implementing every repository contract.
///
/// Mirrors the PostgreSQL schema's constraints: live emails and live role
/// names are unique, and memberships must reference existing rows.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.live_user_with_email(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn insert(&self, email: &str, name: Option<&str>, password_hash: &str) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.live_user_with_email(email).is_some() {
            return Err(StoreError::Conflict("users_email_live_idx".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.map(str::to_string),
            password_hash: password_hash.to_string(),
            role_ids: Vec::new(),
            group_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;

        if !tables.users.get(&id).is_some_and(|u| u.deleted_at.is_none()) {
            return Ok(None);
        }

        if let Some(email) = &changes.email {
            if tables.live_user_with_email(email).is_some_and(|u| u.id != id) {
                return Err(StoreError::Conflict("users_email_live_idx".to_string()));
            }
        }
        if let Some(role_ids) = &changes.role_ids {
            if let Some(missing) = role_ids.iter().find(|r| !tables.roles.contains_key(*r)) {
                return Err(StoreError::InvalidReference(format!("role {}", missing)));
            }
        }
        if let Some(group_ids) = &changes.group_ids {
            if let Some(missing) = group_ids.iter().find(|g| !tables.groups.contains_key(*g)) {
                return Err(StoreError::InvalidReference(format!("group {}", missing)));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = Some(name);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(mut role_ids) = changes.role_ids {
            role_ids.sort();
            role_ids.dedup();
            user.role_ids = role_ids;
        }
        if let Some(mut group_ids) = changes.group_ids {
            group_ids.sort();
            group_ids.dedup();
            user.group_ids = group_ids;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) if user.deleted_at.is_none() => {
                let now = Utc::now();
                user.deleted_at = Some(now);
                user.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Role>> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .get(&id)
            .filter(|r| r.deleted_at.is_none())
            .cloned())
    }

    async fn insert(&self, name: &str, description: Option<&str>) -> StoreResult<Role> {
        let mut tables = self.tables.write().await;

        if tables.live_role_with_name(name).is_some() {
            return Err(StoreError::Conflict("roles_name_live_idx".to_string()));
        }

        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.roles.insert(role.id, role.clone());

        Ok(role)
    }

    async fn list(&self) -> StoreResult<Vec<Role>> {
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables
            .roles
            .values()
            .filter(|r| r.deleted_at.is_none())
            .cloned()
            .collect();
        roles.sort_by_key(|r| (r.created_at, r.id));
        Ok(roles)
    }

    async fn update(&self, id: Uuid, changes: RoleChanges) -> StoreResult<Option<Role>> {
        let mut tables = self.tables.write().await;

        if let Some(name) = &changes.name {
            if tables.live_role_with_name(name).is_some_and(|r| r.id != id) {
                return Err(StoreError::Conflict("roles_name_live_idx".to_string()));
            }
        }

        let Some(role) = tables.roles.get_mut(&id).filter(|r| r.deleted_at.is_none()) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            role.name = name;
        }
        if let Some(description) = changes.description {
            role.description = Some(description);
        }
        role.updated_at = Utc::now();

        Ok(Some(role.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.roles.get_mut(&id) {
            Some(role) if role.deleted_at.is_none() => {
                let now = Utc::now();
                role.deleted_at = Some(now);
                role.updated_at = now;
            }
            _ => return Ok(false),
        }

        for user in tables.users.values_mut() {
            user.role_ids.retain(|r| *r != id);
        }
        Ok(true)
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .get(&id)
            .filter(|g| g.deleted_at.is_none())
            .map(|g| tables.group_with_children(g)))
    }

    async fn insert(&self, name: &str, parent_group_id: Option<Uuid>) -> StoreResult<Group> {
        let mut tables = self.tables.write().await;

        if let Some(parent) = parent_group_id {
            if !tables.groups.contains_key(&parent) {
                return Err(StoreError::InvalidReference(format!("group {}", parent)));
            }
        }

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_group_id,
            child_group_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.groups.insert(group.id, group.clone());

        Ok(group)
    }

    async fn list(&self) -> StoreResult<Vec<Group>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables
            .groups
            .values()
            .filter(|g| g.deleted_at.is_none())
            .map(|g| tables.group_with_children(g))
            .collect();
        groups.sort_by_key(|g| (g.created_at, g.id));
        Ok(groups)
    }

    async fn update(&self, id: Uuid, changes: GroupChanges) -> StoreResult<Option<Group>> {
        let mut tables = self.tables.write().await;

        if let Some(Some(parent)) = changes.parent_group_id {
            if !tables.groups.contains_key(&parent) {
                return Err(StoreError::InvalidReference(format!("group {}", parent)));
            }
        }

        let Some(group) = tables.groups.get_mut(&id).filter(|g| g.deleted_at.is_none()) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            group.name = name;
        }
        if let Some(parent) = changes.parent_group_id {
            group.parent_group_id = parent;
        }
        group.updated_at = Utc::now();
        let group = group.clone();

        Ok(Some(tables.group_with_children(&group)))
    }

    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        match tables.groups.get_mut(&id) {
            Some(group) if group.deleted_at.is_none() => {
                group.deleted_at = Some(now);
                group.updated_at = now;
            }
            _ => return Ok(false),
        }

        for child in tables
            .groups
            .values_mut()
            .filter(|g| g.parent_group_id == Some(id))
        {
            child.parent_group_id = None;
            child.updated_at = now;
        }
        for user in tables.users.values_mut() {
            user.group_ids.retain(|g| *g != id);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deleted_users_do_not_resolve_and_free_their_email() {
        let store = MemoryStore::new();
        let first = UserRepository::insert(&store, "a@example.com", None, "hash").await.unwrap();

        assert!(UserRepository::soft_delete(&store, first.id).await.unwrap());
        assert!(UserRepository::find_by_id(&store, first.id).await.unwrap().is_none());
        assert!(store.find_by_email("a@example.com").await.unwrap().is_none());
        assert!(!UserRepository::soft_delete(&store, first.id).await.unwrap());

        let second = UserRepository::insert(&store, "a@example.com", None, "hash").await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn duplicate_live_email_conflicts() {
        let store = MemoryStore::new();
        UserRepository::insert(&store, "a@example.com", None, "hash").await.unwrap();

        let err = UserRepository::insert(&store, "a@example.com", None, "other")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_group_detaches_children_and_memberships() {
        let store = MemoryStore::new();
        let parent = GroupRepository::insert(&store, "parent", None).await.unwrap();
        let child = GroupRepository::insert(&store, "child", Some(parent.id)).await.unwrap();
        let user = UserRepository::insert(&store, "a@example.com", None, "hash").await.unwrap();
        UserRepository::update(
            &store,
            user.id,
            UserChanges {
                group_ids: Some(vec![parent.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let listed = GroupRepository::find_by_id(&store, parent.id).await.unwrap().unwrap();
        assert_eq!(listed.child_group_ids, vec![child.id]);

        assert!(GroupRepository::soft_delete(&store, parent.id).await.unwrap());

        let child = GroupRepository::find_by_id(&store, child.id).await.unwrap().unwrap();
        assert_eq!(child.parent_group_id, None);
        let user = UserRepository::find_by_id(&store, user.id).await.unwrap().unwrap();
        assert!(user.group_ids.is_empty());
    }
}
