use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    config::SESSION_DURATION_DAYS,
    error::Result,
    middleware_layer::auth::SESSION_COOKIE,
    models::user::User,
    state::AppState,
    validation::json::ValidatedJson,
};

/// The request payload for signup.
#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[garde(email, length(max = 255))]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
    #[garde(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// The request payload for login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(length(min = 1, max = 255))]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// A bare confirmation message.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Builds the HTTP-only session cookie.
fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);

    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::days(SESSION_DURATION_DAYS));
    cookie.set_path("/");

    cookie
}

/// Handles signup.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<Response> {
    tracing::info!("📝 Signup attempt for: {}", payload.email);

    let user = state
        .verifier
        .register(&payload.email, &payload.password, payload.name.as_deref())
        .await?;

    tracing::info!("✅ User signed up: {}", user.id);

    let response = AuthResponse {
        success: true,
        message: "User registered, you can now log in".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles login. Sets the session cookie on success.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt for: {}", payload.email);

    let user = state
        .verifier
        .verify(&payload.email, &payload.password)
        .await?;

    let session = state.tokens.issue(&user)?;
    cookies.add(session_cookie(session.token, state.config.secure_cookies));

    tracing::info!("✅ User logged in: {} (session expires {})", user.id, session.expires_at);

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles logout by clearing the session cookie.
///
/// Tokens are stateless, so a copy of the token kept elsewhere stays valid until it expires.
#[axum::debug_handler]
pub async fn logout(cookies: Cookies) -> Result<Response> {
    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    tracing::info!("👋 Session cookie cleared");

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the principal resolved by the guard.
#[axum::debug_handler]
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// The liveness check body.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness check. Touches no store.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
