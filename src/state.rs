use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::error::StoreResult;
use crate::repositories::{
    group::{GroupRepository, PgGroupRepository},
    memory::MemoryStore,
    role::{PgRoleRepository, RoleRepository},
    user::{PgUserRepository, UserRepository},
};
use crate::services::{auth::CredentialVerifier, token::TokenGuard};

/// The application's state.
///
/// Every collaborator is injected here; nothing reaches for a global handle.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// The user repository.
    pub users: Arc<dyn UserRepository>,
    /// The role repository.
    pub roles: Arc<dyn RoleRepository>,
    /// The group repository.
    pub groups: Arc<dyn GroupRepository>,
    /// Turns credential pairs into principals.
    pub verifier: CredentialVerifier,
    /// Issues and validates session tokens.
    pub tokens: TokenGuard,
}

impl AppState {
    /// Creates a new `AppState` for the configured backend.
    ///
    /// For PostgreSQL this builds the pool and brings the schema up to date.
    pub async fn new(config: &Config) -> StoreResult<Self> {
        match &config.store {
            StoreBackend::Postgres { database_url } => {
                let pool = crate::db::create_pool(database_url, config.store_timeout)?;
                crate::db::migrate(&pool).await?;
                tracing::info!("✅ PostgreSQL pool initialized");

                Ok(Self::from_parts(
                    config.clone(),
                    Arc::new(PgUserRepository::new(pool.clone())),
                    Arc::new(PgRoleRepository::new(pool.clone())),
                    Arc::new(PgGroupRepository::new(pool)),
                ))
            }
            StoreBackend::Memory => {
                tracing::warn!("⚠️ Using the in-memory store: data is lost on restart");
                Ok(Self::in_memory(config.clone()))
            }
        }
    }

    /// Creates an `AppState` whose repositories all live in one `MemoryStore`.
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(config, store.clone(), store.clone(), store)
    }

    /// Wires the authenticator around the given repositories.
    pub fn from_parts(
        config: Config,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        groups: Arc<dyn GroupRepository>,
    ) -> Self {
        let verifier = CredentialVerifier::new(users.clone(), config.store_timeout);
        let tokens = TokenGuard::new(&config.secret, users.clone(), config.store_timeout);

        Self {
            config: Arc::new(config),
            users,
            roles,
            groups,
            verifier,
            tokens,
        }
    }
}
