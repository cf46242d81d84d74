use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::group::{Group, GroupChanges},
    state::AppState,
};

/// Lists every live group.
pub async fn list_groups(state: &AppState) -> Result<Vec<Group>> {
    Ok(state.groups.list().await?)
}

/// Gets a live group by ID, with its children.
pub async fn get_group(state: &AppState, group_id: Uuid) -> Result<Group> {
    state.groups.find_by_id(group_id).await?.ok_or(AppError::NotFound)
}

/// Creates a group, optionally under a live parent.
pub async fn create_group(
    state: &AppState,
    name: &str,
    parent_group_id: Option<Uuid>,
) -> Result<Group> {
    if let Some(parent_id) = parent_group_id {
        ensure_live_parent(state, parent_id).await?;
    }

    let group = state.groups.insert(name, parent_group_id).await?;

    tracing::info!("✅ Group created: {} ({})", group.name, group.id);
    Ok(group)
}

/// Updates a group.
///
/// Re-parenting is refused when the new parent is the group itself or one of
/// its descendants.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `group_id` - The ID of the group to update.
/// * `changes` - The requested changes. `parent_group_id: Some(None)` detaches the group.
pub async fn update_group(state: &AppState, group_id: Uuid, changes: GroupChanges) -> Result<Group> {
    if let Some(Some(parent_id)) = changes.parent_group_id {
        if parent_id == group_id {
            return Err(AppError::Validation("A group cannot be its own parent".to_string()));
        }
        ensure_live_parent(state, parent_id).await?;

        if is_descendant(state, parent_id, group_id).await? {
            return Err(AppError::Validation(
                "A group cannot be moved under one of its descendants".to_string(),
            ));
        }
    }

    state
        .groups
        .update(group_id, changes)
        .await?
        .ok_or(AppError::NotFound)
}

/// Soft-deletes a group. Its children become roots and its memberships are dropped.
pub async fn delete_group(state: &AppState, group_id: Uuid) -> Result<()> {
    if !state.groups.soft_delete(group_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("🗑️ Group deleted: {}", group_id);
    Ok(())
}

async fn ensure_live_parent(state: &AppState, parent_id: Uuid) -> Result<()> {
    match state.groups.find_by_id(parent_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!(
            "Parent group {} does not exist",
            parent_id
        ))),
    }
}

/// Walks up from `candidate` and reports whether `ancestor` is on the way.
async fn is_descendant(state: &AppState, candidate: Uuid, ancestor: Uuid) -> Result<bool> {
    let mut visited = HashSet::new();
    let mut current = Some(candidate);

    while let Some(id) = current {
        if id == ancestor {
            return Ok(true);
        }
        if !visited.insert(id) {
            // already cyclic; stop rather than loop
            return Ok(true);
        }
        current = state
            .groups
            .find_by_id(id)
            .await?
            .and_then(|group| group.parent_group_id);
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn state() -> AppState {
        AppState::in_memory(Config::in_memory(b"test-secret"))
    }

    fn reparent(parent: Uuid) -> GroupChanges {
        GroupChanges {
            name: None,
            parent_group_id: Some(Some(parent)),
        }
    }

    #[tokio::test]
    async fn group_cannot_be_its_own_parent() {
        let state = state();
        let group = create_group(&state, "staff", None).await.unwrap();

        let err = update_group(&state, group.id, reparent(group.id)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn group_cannot_move_under_a_descendant() {
        let state = state();
        let root = create_group(&state, "root", None).await.unwrap();
        let middle = create_group(&state, "middle", Some(root.id)).await.unwrap();
        let leaf = create_group(&state, "leaf", Some(middle.id)).await.unwrap();

        let err = update_group(&state, root.id, reparent(leaf.id)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let root = get_group(&state, root.id).await.unwrap();
        assert_eq!(root.parent_group_id, None);
    }

    #[tokio::test]
    async fn sibling_can_be_reparented() {
        let state = state();
        let root = create_group(&state, "root", None).await.unwrap();
        let a = create_group(&state, "a", Some(root.id)).await.unwrap();
        let b = create_group(&state, "b", Some(root.id)).await.unwrap();

        let moved = update_group(&state, b.id, reparent(a.id)).await.unwrap();
        assert_eq!(moved.parent_group_id, Some(a.id));

        let a = get_group(&state, a.id).await.unwrap();
        assert_eq!(a.child_group_ids, vec![b.id]);
    }

    #[tokio::test]
    async fn deleted_parent_is_rejected() {
        let state = state();
        let parent = create_group(&state, "parent", None).await.unwrap();
        delete_group(&state, parent.id).await.unwrap();

        let err = create_group(&state, "child", Some(parent.id)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
