use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// A failure reported by a repository.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store did not answer in time.
    #[error("Store timed out")]
    Timeout,

    /// The store could not be reached or rejected the query.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A unique constraint was violated.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        let constraint = e
            .as_db_error()
            .and_then(|db| db.constraint())
            .unwrap_or("unknown")
            .to_string();

        match e.code() {
            Some(code) if *code == SqlState::UNIQUE_VIOLATION => StoreError::Conflict(constraint),
            Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => {
                StoreError::InvalidReference(constraint)
            }
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        match e {
            deadpool_postgres::PoolError::Timeout(_) => StoreError::Timeout,
            deadpool_postgres::PoolError::Backend(e) => StoreError::from(e),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// A `Result` type for repository calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Why the authenticator refused a request.
///
/// Callers at the HTTP boundary collapse these into a generic message; the
/// variant is only ever logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Email already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password. The two cases are deliberately merged.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Principal no longer exists")]
    PrincipalNotFound,

    #[error("Store timed out")]
    Timeout,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Hashing or token encoding failed.
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Timeout => AuthError::Timeout,
            StoreError::Unavailable(msg) => AuthError::Unavailable(msg),
            // the only unique index a principal insert can hit is the email
            StoreError::Conflict(_) => AuthError::DuplicateEmail,
            StoreError::InvalidReference(msg) => AuthError::Internal(msg),
        }
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A persistence error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An authentication error.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The guard rejected the request.
    #[error("Unauthorized")]
    Unauthorized,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request body exceeded the configured limit.
    #[error("Payload too large")]
    PayloadTooLarge,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        AppError::Validation(report.to_string())
    }
}

impl AppError {
    /// The status code and client-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Store(StoreError::Timeout | StoreError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".to_string(),
            ),
            AppError::Store(StoreError::Conflict(_)) => {
                (StatusCode::CONFLICT, "Resource already exists".to_string())
            }
            AppError::Store(StoreError::InvalidReference(_)) => (
                StatusCode::BAD_REQUEST,
                "Referenced resource does not exist".to_string(),
            ),

            AppError::Auth(AuthError::DuplicateEmail) => {
                (StatusCode::BAD_REQUEST, "Failed to create user".to_string())
            }
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::BAD_REQUEST,
                "Invalid email or password".to_string(),
            ),
            AppError::Auth(
                AuthError::MalformedToken
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::PrincipalNotFound,
            )
            | AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Auth(AuthError::Timeout | AuthError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".to_string(),
            ),
            AppError::Auth(AuthError::Internal(_)) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),

            AppError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            AppError::Store(e @ (StoreError::Conflict(_) | StoreError::InvalidReference(_))) => {
                tracing::debug!("Rejected write: {}", e)
            }
            AppError::Store(e) => tracing::error!("Store error: {}", e),
            AppError::Auth(AuthError::Internal(msg)) | AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg)
            }
            AppError::Auth(e) => tracing::warn!("Authentication failed: {}", e),
            AppError::Unauthorized => tracing::warn!("Authorization failed"),
            AppError::NotFound => tracing::debug!("Resource not found"),
            AppError::Validation(msg) => tracing::debug!("Validation error: {}", msg),
            AppError::PayloadTooLarge => tracing::debug!("Request body too large"),
        }

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
