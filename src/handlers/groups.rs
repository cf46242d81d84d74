use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use garde::Validate;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{
    error::Result,
    handlers::auth::MessageResponse,
    models::group::GroupChanges,
    services::groups as group_service,
    state::AppState,
    validation::{
        json::ValidatedJson,
        path::ValidatedPath,
        rules::{not_blank, not_blank_if_present},
    },
};

/// The request payload for creating a group.
#[derive(Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[garde(length(min = 1, max = 255), custom(not_blank))]
    pub name: String,
    #[garde(skip)]
    pub parent_group_id: Option<Uuid>,
}

/// The request payload for updating a group.
///
/// An absent `parent_group_id` keeps the current parent; an explicit `null` detaches the group.
#[derive(Deserialize, Validate)]
pub struct UpdateGroupRequest {
    #[garde(length(min = 1, max = 255), custom(not_blank_if_present))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[garde(skip)]
    pub parent_group_id: Option<Option<Uuid>>,
}

/// Marks a field as present, even when its value is `null`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

#[axum::debug_handler]
pub async fn list_groups(State(state): State<AppState>) -> Result<Response> {
    let groups = group_service::list_groups(&state).await?;
    Ok((StatusCode::OK, Json(groups)).into_response())
}

#[axum::debug_handler]
pub async fn get_group(
    State(state): State<AppState>,
    ValidatedPath(group_id): ValidatedPath<Uuid>,
) -> Result<Response> {
    let group = group_service::get_group(&state, group_id).await?;
    Ok((StatusCode::OK, Json(group)).into_response())
}

#[axum::debug_handler]
pub async fn create_group(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateGroupRequest>,
) -> Result<Response> {
    let group = group_service::create_group(&state, &req.name, req.parent_group_id).await?;
    Ok((StatusCode::CREATED, Json(group)).into_response())
}

#[axum::debug_handler]
pub async fn update_group(
    State(state): State<AppState>,
    ValidatedPath(group_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateGroupRequest>,
) -> Result<Response> {
    let changes = GroupChanges {
        name: req.name,
        parent_group_id: req.parent_group_id,
    };

    let group = group_service::update_group(&state, group_id, changes).await?;
    Ok((StatusCode::OK, Json(group)).into_response())
}

#[axum::debug_handler]
pub async fn delete_group(
    State(state): State<AppState>,
    ValidatedPath(group_id): ValidatedPath<Uuid>,
) -> Result<Response> {
    group_service::delete_group(&state, group_id).await?;

    let response = MessageResponse {
        message: "Group deleted".to_string(),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_null_parent_differ() {
        let absent: UpdateGroupRequest = serde_json::from_str(r#"{"name":"ops"}"#).unwrap();
        assert_eq!(absent.parent_group_id, None);

        let null: UpdateGroupRequest = serde_json::from_str(r#"{"parent_group_id":null}"#).unwrap();
        assert_eq!(null.parent_group_id, Some(None));

        let id = Uuid::new_v4();
        let set: UpdateGroupRequest =
            serde_json::from_str(&format!(r#"{{"parent_group_id":"{}"}}"#, id)).unwrap();
        assert_eq!(set.parent_group_id, Some(Some(id)));
    }
}
