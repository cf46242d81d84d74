use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::role::{Role, RoleChanges},
    state::AppState,
};

/// Lists every live role.
pub async fn list_roles(state: &AppState) -> Result<Vec<Role>> {
    Ok(state.roles.list().await?)
}

/// Gets a live role by ID.
pub async fn get_role(state: &AppState, role_id: Uuid) -> Result<Role> {
    state.roles.find_by_id(role_id).await?.ok_or(AppError::NotFound)
}

/// Creates a role. Live role names are unique.
pub async fn create_role(state: &AppState, name: &str, description: Option<&str>) -> Result<Role> {
    let role = state.roles.insert(name, description).await?;

    tracing::info!("✅ Role created: {} ({})", role.name, role.id);
    Ok(role)
}

/// Updates a role.
pub async fn update_role(state: &AppState, role_id: Uuid, changes: RoleChanges) -> Result<Role> {
    state
        .roles
        .update(role_id, changes)
        .await?
        .ok_or(AppError::NotFound)
}

/// Soft-deletes a role and strips it from every user holding it.
pub async fn delete_role(state: &AppState, role_id: Uuid) -> Result<()> {
    if !state.roles.soft_delete(role_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("🗑️ Role deleted: {}", role_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, error::StoreError, models::user::UserChanges};

    #[tokio::test]
    async fn deleting_a_role_removes_it_from_users() {
        let state = AppState::in_memory(Config::in_memory(b"test-secret"));
        let role = create_role(&state, "admin", Some("Administrators")).await.unwrap();
        let user = state.users.insert("alice@example.com", None, "hash").await.unwrap();
        state
            .users
            .update(
                user.id,
                UserChanges {
                    role_ids: Some(vec![role.id]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        delete_role(&state, role.id).await.unwrap();

        let user = state.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(user.role_ids.is_empty());
        assert!(matches!(get_role(&state, role.id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn live_role_names_are_unique() {
        let state = AppState::in_memory(Config::in_memory(b"test-secret"));
        create_role(&state, "admin", None).await.unwrap();

        let err = create_role(&state, "admin", None).await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Conflict(_))));
    }
}
