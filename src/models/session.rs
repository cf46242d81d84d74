use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The claim set carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// The ID of the user this token authenticates.
    pub sub: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds. The token is valid while `now <= exp`.
    pub exp: i64,
}

/// A freshly issued session token.
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// The encoded `header.claims.signature` string.
    pub token: String,
    /// The timestamp when the token stops validating.
    pub expires_at: DateTime<Utc>,
}
