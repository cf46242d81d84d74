use std::{future::Future, sync::Arc, time::Duration};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use once_cell::sync::Lazy;
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use crate::{
    error::{AuthError, StoreResult},
    models::user::User,
    repositories::user::UserRepository,
};

/// The memory cost for Argon2 in KiB.
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 2;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 1;

/// Verified against when the email is unknown, so a miss costs as much as a hit.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("usergate-dummy-password").ok());

fn argon2() -> Result<Argon2<'static>, AuthError> {
    let params = ParamsBuilder::new()
        .m_cost(ARGON2_MEMORY_KIB)
        .t_cost(ARGON2_ITERATIONS)
        .p_cost(ARGON2_PARALLELISM)
        .build()
        .map_err(|e| AuthError::Internal(format!("Argon2 params: {}", e)))?;

    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hashes a password using Argon2id with a fresh random salt.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the PHC-formatted hash.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::Internal(format!("Salt encoding error: {}", e)))?;

    let password_hash = argon2()?
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AuthError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a password against a stored hash in constant time.
///
/// An unparseable hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("❌ Stored password hash could not be parsed");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Runs a repository call, turning a missed deadline into `AuthError::Timeout`.
pub(crate) async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, AuthError>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => {
            tracing::error!("❌ Store call exceeded {:?}", limit);
            Err(AuthError::Timeout)
        }
    }
}

/// Turns credential pairs into principals.
#[derive(Clone)]
pub struct CredentialVerifier {
    users: Arc<dyn UserRepository>,
    store_timeout: Duration,
}

impl CredentialVerifier {
    /// Creates a new `CredentialVerifier`.
    pub fn new(users: Arc<dyn UserRepository>, store_timeout: Duration) -> Self {
        Self {
            users,
            store_timeout,
        }
    }

    /// Hashes a password off the async runtime.
    pub async fn hash_secret(&self, password: &str) -> Result<String, AuthError> {
        let password = Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// Registers a new principal.
    ///
    /// # Arguments
    ///
    /// * `email` - The email to register, stored as given.
    /// * `password` - The plaintext password. Only its hash is persisted.
    /// * `name` - An optional display name.
    ///
    /// # Returns
    ///
    /// The created `User`, or `AuthError::DuplicateEmail` if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        tracing::debug!("🔐 Registering user: {}", email);

        if with_deadline(self.store_timeout, self.users.find_by_email(email))
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hash_secret(password).await?;

        // a concurrent signup for the same email loses on the unique index
        let user = with_deadline(
            self.store_timeout,
            self.users.insert(email, name, &password_hash),
        )
        .await?;

        tracing::info!("✅ User registered with ID: {}", user.id);
        Ok(user)
    }

    /// Checks a credential pair.
    ///
    /// Unknown emails and wrong passwords both yield `AuthError::InvalidCredentials`.
    pub async fn verify(&self, email: &str, password: &str) -> Result<User, AuthError> {
        tracing::debug!("🔐 Authenticating user: {}", email);

        let user = with_deadline(self.store_timeout, self.users.find_by_email(email)).await?;

        let stored_hash = match &user {
            Some(user) => Some(user.password_hash.clone()),
            None => DUMMY_HASH.clone(),
        };
        let password = Zeroizing::new(password.to_owned());

        let matches = tokio::task::spawn_blocking(move || {
            stored_hash.is_some_and(|hash| verify_password(&password, &hash))
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))?;

        match user {
            Some(user) if matches => {
                tracing::info!("✅ User authenticated: {}", user.id);
                Ok(user)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::user::UserChanges,
        repositories::memory::MemoryStore,
    };
    use async_trait::async_trait;
    use uuid::Uuid;

    fn verifier() -> (Arc<MemoryStore>, CredentialVerifier) {
        let store = Arc::new(MemoryStore::new());
        let verifier = CredentialVerifier::new(store.clone(), Duration::from_secs(5));
        (store, verifier)
    }

    #[tokio::test]
    async fn registered_credentials_verify() {
        let (_, verifier) = verifier();
        let registered = verifier
            .register("alice@example.com", "pw123", Some("Alice"))
            .await
            .unwrap();

        let verified = verifier.verify("alice@example.com", "pw123").await.unwrap();
        assert_eq!(verified.id, registered.id);
        assert_eq!(verified.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn plaintext_is_never_stored() {
        let (store, verifier) = verifier();
        let user = verifier.register("alice@example.com", "pw123", None).await.unwrap();

        let stored = store.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(stored.id, user.id);
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert!(!stored.password_hash.contains("pw123"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let (_, verifier) = verifier();
        verifier.register("alice@example.com", "pw123", None).await.unwrap();

        let wrong = verifier.verify("alice@example.com", "nope").await.unwrap_err();
        let unknown = verifier.verify("bob@example.com", "pw123").await.unwrap_err();

        assert_eq!(wrong, AuthError::InvalidCredentials);
        assert_eq!(unknown, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let (_, verifier) = verifier();
        verifier.register("alice@example.com", "pw123", None).await.unwrap();

        let err = verifier.verify("Alice@example.com", "pw123").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_original_hash() {
        let (store, verifier) = verifier();
        verifier.register("alice@example.com", "pw123", None).await.unwrap();
        let before = store.find_by_email("alice@example.com").await.unwrap().unwrap();

        let err = verifier
            .register("alice@example.com", "another", None)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::DuplicateEmail);

        let after = store.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);
        assert!(verifier.verify("alice@example.com", "pw123").await.is_ok());
    }

    #[test]
    fn corrupt_hash_never_verifies() {
        assert!(!verify_password("pw123", "not-a-phc-string"));
    }

    /// A repository that never answers in time.
    struct StalledUsers;

    #[async_trait]
    impl UserRepository for StalledUsers {
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
        async fn find_by_id(&self, _id: Uuid) -> StoreResult<Option<User>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
        async fn insert(&self, _: &str, _: Option<&str>, _: &str) -> StoreResult<User> {
            unreachable!("insert is never reached when lookups stall")
        }
        async fn list(&self) -> StoreResult<Vec<User>> {
            Ok(Vec::new())
        }
        async fn update(&self, _: Uuid, _: UserChanges) -> StoreResult<Option<User>> {
            Ok(None)
        }
        async fn soft_delete(&self, _: Uuid) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn stalled_store_times_out() {
        let verifier = CredentialVerifier::new(Arc::new(StalledUsers), Duration::from_millis(50));

        let err = verifier.verify("alice@example.com", "pw123").await.unwrap_err();
        assert_eq!(err, AuthError::Timeout);

        let err = verifier
            .register("alice@example.com", "pw123", None)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Timeout);
    }
}
