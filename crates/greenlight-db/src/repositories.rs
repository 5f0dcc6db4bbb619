//! Repository traits consumed by the request pipeline and the feature
//! modules. Implementations: [`crate::PgStore`] and [`crate::MemoryStore`].

use std::sync::Arc;

use async_trait::async_trait;

use greenlight_models::{
    CreateMovieDto, Metadata, Movie, MovieFilters, Permissions, Token, TokenScope, User,
};

use crate::error::Result;
use crate::{MemoryStore, PgPool, PgStore};

/// Fields of a user about to be registered.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateEmail` when the address is taken.
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn get(&self, id: i64) -> Result<User>;

    async fn get_by_email(&self, email: &str) -> Result<User>;

    /// Saves `user` if its version still matches the stored one and returns
    /// the row with the bumped version. A stale version is an `EditConflict`.
    async fn update(&self, user: &User) -> Result<User>;

    /// Owner of the unexpired token stored under `hash` for `scope`.
    ///
    /// Wrong hash, wrong scope and past expiry all surface as
    /// `RecordNotFound`.
    async fn get_for_token(&self, scope: TokenScope, hash: &[u8]) -> Result<User>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Stores the hash, owner, expiry and scope. The plaintext is never
    /// written.
    async fn insert(&self, token: &Token) -> Result<()>;

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<()>;
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions>;

    /// Grants `codes`; codes the user already holds are ignored.
    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<()>;
}

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn insert(&self, movie: &CreateMovieDto) -> Result<Movie>;

    async fn get(&self, id: i64) -> Result<Movie>;

    /// Optimistic-locking update, see [`UserRepository::update`].
    async fn update(&self, movie: &Movie) -> Result<Movie>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn get_all(&self, filters: &MovieFilters) -> Result<(Vec<Movie>, Metadata)>;
}

/// The persistence collaborator handed to the application state.
///
/// Each repository is a trait object so tests can swap in a slow or failing
/// implementation for a single concern.
#[derive(Clone)]
pub struct Models {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub movies: Arc<dyn MovieRepository>,
}

impl Models {
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + TokenRepository + PermissionRepository + MovieRepository + 'static,
    {
        Self {
            users: store.clone(),
            tokens: store.clone(),
            permissions: store.clone(),
            movies: store,
        }
    }
}
