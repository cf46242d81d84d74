use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    state::AppState,
};

/// The cookie carrying the session token.
pub const SESSION_COOKIE: &str = "Authorization";

/// Extracts the session token from the request cookies.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the raw token if a non-empty cookie is present.
fn extract_session_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// A middleware that requires a valid session token.
///
/// On success the resolved `User` is inserted into the request extensions.
/// Every failure answers 401 with a generic body; the precise reason is only logged.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_session_token(&cookies).ok_or_else(|| {
        tracing::warn!("❌ No {} cookie found", SESSION_COOKIE);
        AppError::Unauthorized
    })?;

    let user = state.tokens.validate(&token).await.map_err(|e| {
        tracing::warn!("❌ Session rejected: {}", e);
        AppError::Unauthorized
    })?;

    tracing::debug!("✅ User authenticated: {}", user.id);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
