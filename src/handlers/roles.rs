use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::Result,
    handlers::auth::MessageResponse,
    models::role::RoleChanges,
    services::roles as role_service,
    state::AppState,
    validation::{
        json::ValidatedJson,
        path::ValidatedPath,
        rules::{not_blank, not_blank_if_present},
    },
};

/// The request payload for creating a role.
#[derive(Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[garde(length(min = 1, max = 255), custom(not_blank))]
    pub name: String,
    #[garde(length(max = 1000))]
    pub description: Option<String>,
}

/// The request payload for updating a role.
#[derive(Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[garde(length(min = 1, max = 255), custom(not_blank_if_present))]
    pub name: Option<String>,
    #[garde(length(max = 1000))]
    pub description: Option<String>,
}

#[axum::debug_handler]
pub async fn list_roles(State(state): State<AppState>) -> Result<Response> {
    let roles = role_service::list_roles(&state).await?;
    Ok((StatusCode::OK, Json(roles)).into_response())
}

#[axum::debug_handler]
pub async fn get_role(
    State(state): State<AppState>,
    ValidatedPath(role_id): ValidatedPath<Uuid>,
) -> Result<Response> {
    let role = role_service::get_role(&state, role_id).await?;
    Ok((StatusCode::OK, Json(role)).into_response())
}

#[axum::debug_handler]
pub async fn create_role(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateRoleRequest>,
) -> Result<Response> {
    let role = role_service::create_role(&state, &req.name, req.description.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(role)).into_response())
}

#[axum::debug_handler]
pub async fn update_role(
    State(state): State<AppState>,
    ValidatedPath(role_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateRoleRequest>,
) -> Result<Response> {
    let changes = RoleChanges {
        name: req.name,
        description: req.description,
    };

    let role = role_service::update_role(&state, role_id, changes).await?;
    Ok((StatusCode::OK, Json(role)).into_response())
}

#[axum::debug_handler]
pub async fn delete_role(
    State(state): State<AppState>,
    ValidatedPath(role_id): ValidatedPath<Uuid>,
) -> Result<Response> {
    role_service::delete_role(&state, role_id).await?;

    let response = MessageResponse {
        message: "Role deleted".to_string(),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}
