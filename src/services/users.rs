use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::{User, UserChanges},
    state::AppState,
};

/// A requested change to a user, with the password still in plaintext.
#[derive(Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role_ids: Option<Vec<Uuid>>,
    pub group_ids: Option<Vec<Uuid>>,
}

/// Lists every live user.
pub async fn list_users(state: &AppState) -> Result<Vec<User>> {
    Ok(state.users.list().await?)
}

/// Gets a live user by ID.
///
/// # Returns
///
/// The `User`, or `AppError::NotFound` if it does not exist or was deleted.
pub async fn get_user(state: &AppState, user_id: Uuid) -> Result<User> {
    state.users.find_by_id(user_id).await?.ok_or(AppError::NotFound)
}

/// Creates a user through the same path as signup.
pub async fn create_user(
    state: &AppState,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<User> {
    Ok(state.verifier.register(email, password, name).await?)
}

/// Updates a user.
///
/// A new password is re-hashed before it reaches the store. Every referenced
/// role and group must be live.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `user_id` - The ID of the user to update.
/// * `update` - The requested changes.
///
/// # Returns
///
/// The updated `User`.
pub async fn update_user(state: &AppState, user_id: Uuid, update: UserUpdate) -> Result<User> {
    if let Some(role_ids) = &update.role_ids {
        for role_id in role_ids {
            if state.roles.find_by_id(*role_id).await?.is_none() {
                return Err(AppError::Validation(format!("Role {} does not exist", role_id)));
            }
        }
    }

    if let Some(group_ids) = &update.group_ids {
        for group_id in group_ids {
            if state.groups.find_by_id(*group_id).await?.is_none() {
                return Err(AppError::Validation(format!("Group {} does not exist", group_id)));
            }
        }
    }

    let password_hash = match &update.password {
        Some(password) => Some(state.verifier.hash_secret(password).await?),
        None => None,
    };

    let changes = UserChanges {
        email: update.email,
        name: update.name,
        password_hash,
        role_ids: update.role_ids.map(dedup),
        group_ids: update.group_ids.map(dedup),
    };

    let user = state
        .users
        .update(user_id, changes)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("✅ User updated: {}", user.id);
    Ok(user)
}

/// Soft-deletes a user. Outstanding tokens stop resolving immediately.
pub async fn delete_user(state: &AppState, user_id: Uuid) -> Result<()> {
    if !state.users.soft_delete(user_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("🗑️ User deleted: {}", user_id);
    Ok(())
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, error::StoreError, services::auth::verify_password};

    fn state() -> AppState {
        AppState::in_memory(Config::in_memory(b"test-secret"))
    }

    #[tokio::test]
    async fn password_change_is_rehashed() {
        let state = state();
        let user = create_user(&state, "alice@example.com", "pw123", None).await.unwrap();

        let update = UserUpdate {
            password: Some("new-password".to_string()),
            ..Default::default()
        };
        let updated = update_user(&state, user.id, update).await.unwrap();

        assert_ne!(updated.password_hash, "new-password");
        assert!(verify_password("new-password", &updated.password_hash));
        assert!(state.verifier.verify("alice@example.com", "pw123").await.is_err());
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let state = state();
        let user = create_user(&state, "alice@example.com", "pw123", None).await.unwrap();

        let update = UserUpdate {
            role_ids: Some(vec![Uuid::new_v4()]),
            ..Default::default()
        };
        let err = update_user(&state, user.id, update).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn memberships_are_deduplicated() {
        let state = state();
        let user = create_user(&state, "alice@example.com", "pw123", None).await.unwrap();
        let role = state.roles.insert("admin", None).await.unwrap();

        let update = UserUpdate {
            role_ids: Some(vec![role.id, role.id]),
            ..Default::default()
        };
        let updated = update_user(&state, user.id, update).await.unwrap();
        assert_eq!(updated.role_ids, vec![role.id]);
    }

    #[tokio::test]
    async fn taking_another_users_email_conflicts() {
        let state = state();
        create_user(&state, "alice@example.com", "pw123", None).await.unwrap();
        let bob = create_user(&state, "bob@example.com", "pw123", None).await.unwrap();

        let update = UserUpdate {
            email: Some("alice@example.com".to_string()),
            ..Default::default()
        };
        let err = update_user(&state, bob.id, update).await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn deleted_user_is_gone() {
        let state = state();
        let user = create_user(&state, "alice@example.com", "pw123", None).await.unwrap();

        delete_user(&state, user.id).await.unwrap();

        assert!(matches!(get_user(&state, user.id).await, Err(AppError::NotFound)));
        assert!(matches!(delete_user(&state, user.id).await, Err(AppError::NotFound)));
    }
}
