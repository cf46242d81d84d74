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
    services::users::{self as user_service, UserUpdate},
    state::AppState,
    validation::{json::ValidatedJson, path::ValidatedPath},
};

/// The request payload for creating a user.
#[derive(Deserialize, Validate)]
pub struct CreateUserRequest {
    #[garde(email, length(max = 255))]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
    #[garde(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// The request payload for updating a user. Absent fields are left untouched.
#[derive(Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[garde(email, length(max = 255))]
    pub email: Option<String>,
    #[garde(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[garde(length(min = 1, max = 128))]
    pub password: Option<String>,
    #[garde(skip)]
    pub role_ids: Option<Vec<Uuid>>,
    #[garde(skip)]
    pub group_ids: Option<Vec<Uuid>>,
}

/// Lists users.
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<Response> {
    let users = user_service::list_users(&state).await?;
    Ok((StatusCode::OK, Json(users)).into_response())
}

/// Gets a user.
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    ValidatedPath(user_id): ValidatedPath<Uuid>,
) -> Result<Response> {
    let user = user_service::get_user(&state, user_id).await?;
    Ok((StatusCode::OK, Json(user)).into_response())
}

/// Creates a user.
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<Response> {
    let user =
        user_service::create_user(&state, &req.email, &req.password, req.name.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// Updates a user.
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    ValidatedPath(user_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Response> {
    let update = UserUpdate {
        email: req.email,
        name: req.name,
        password: req.password,
        role_ids: req.role_ids,
        group_ids: req.group_ids,
    };

    let user = user_service::update_user(&state, user_id, update).await?;
    Ok((StatusCode::OK, Json(user)).into_response())
}

/// Soft-deletes a user.
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    ValidatedPath(user_id): ValidatedPath<Uuid>,
) -> Result<Response> {
    user_service::delete_user(&state, user_id).await?;

    let response = MessageResponse {
        message: "User deleted".to_string(),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}
