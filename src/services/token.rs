use std::{sync::Arc, time::Duration};

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    config::SESSION_DURATION_DAYS,
    error::AuthError,
    models::{
        session::{Claims, SessionToken},
        user::User,
    },
    repositories::user::UserRepository,
    services::auth::with_deadline,
};

/// The bare `alg` of a header `jsonwebtoken` refused to parse.
#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
}

/// Classifies a header `decode_header` rejected.
///
/// A readable header naming any algorithm other than HS256 (`none` included)
/// is a substitution attempt, not a malformed token.
fn classify_unreadable_header(token: &str) -> AuthError {
    let alg = token
        .split('.')
        .next()
        .and_then(|segment| general_purpose::URL_SAFE_NO_PAD.decode(segment).ok())
        .and_then(|bytes| sonic_rs::from_slice::<RawHeader>(&bytes).ok())
        .and_then(|header| header.alg);

    match alg {
        Some(alg) if alg != "HS256" => AuthError::InvalidSignature,
        _ => AuthError::MalformedToken,
    }
}

/// Issues and validates HS256 session tokens.
///
/// Holds no mutable state; clones share the same keys and repository.
#[derive(Clone)]
pub struct TokenGuard {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    users: Arc<dyn UserRepository>,
    store_timeout: Duration,
}

impl TokenGuard {
    /// Creates a new `TokenGuard` signing with `secret`.
    pub fn new(secret: &[u8], users: Arc<dyn UserRepository>, store_timeout: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            users,
            store_timeout,
        }
    }

    /// Issues a token for `user`, valid for 30 days from now.
    pub fn issue(&self, user: &User) -> Result<SessionToken, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issues a token for `user` as if it were `issued_at`.
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<SessionToken, AuthError> {
        let expires_at = issued_at + chrono::Duration::days(SESSION_DURATION_DAYS);
        let claims = Claims {
            sub: user.id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))?;

        Ok(SessionToken { token, expires_at })
    }

    /// Validates `token` and resolves the principal it names.
    ///
    /// The principal is re-read on every call, so deleting a user revokes
    /// all of their outstanding tokens.
    pub async fn validate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.verify_claims(token, Utc::now())?;

        with_deadline(self.store_timeout, self.users.find_by_id(user_id))
            .await?
            .ok_or(AuthError::PrincipalNotFound)
    }

    /// Checks structure, algorithm, expiry and signature, in that order.
    ///
    /// # Returns
    ///
    /// The ID carried in the `sub` claim.
    pub fn verify_claims(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        let header = decode_header(token).map_err(|_| classify_unreadable_header(token))?;
        if header.alg != Algorithm::HS256 {
            return Err(AuthError::InvalidSignature);
        }

        // expiry is judged before the signature: an expired token is Expired whatever its key
        let mut unverified = Validation::new(Algorithm::HS256);
        unverified.insecure_disable_signature_validation();
        unverified.validate_exp = false;
        unverified.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &unverified)
            .map_err(|_| AuthError::MalformedToken)?
            .claims;

        if now.timestamp() > claims.exp {
            return Err(AuthError::Expired);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
            _ => AuthError::MalformedToken,
        })?;

        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::MalformedToken)
    }
}
