pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use models::{Principal, Role};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The contract the authentication gate consumes. The gate only ever reads;
/// whoever owns the users table implements this.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Look up a principal by username, with role and permissions resolved.
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError>;
}

/// Fields for creating a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: Option<Uuid>,
    pub is_active: bool,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Full user/role directory consumed by the management endpoints.
#[async_trait]
pub trait UserStore: PrincipalStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError>;

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<Principal>, StoreError>;

    async fn create_user(&self, new_user: NewUser) -> Result<Principal, StoreError>;

    /// Returns the updated principal, or `None` when the id does not exist.
    async fn update_user(
        &self,
        id: Uuid,
        update: UserUpdate,
    ) -> Result<Option<Principal>, StoreError>;

    /// Returns whether a row was deleted.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;

    /// Cheap liveness probe for the health endpoint.
    async fn health(&self) -> Result<(), StoreError>;
}
