use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::models::{Permission, Principal, Role};
use super::{NewUser, PrincipalStore, StoreError, UserStore, UserUpdate};
use crate::auth::password;

/// In-memory user/role directory. Backs the test suites and database-less
/// development mode; seeded with the same default roles, permissions and
/// admin account the database initializer creates.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
    lookups: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    users: Vec<Principal>,
    roles: Vec<Role>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the default role/permission matrix
    /// and an active `admin`/`admin123` SuperUser account.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut inner = store
                .inner
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            inner.roles = default_roles();

            let superuser = inner.roles.iter().find(|r| r.name == "SuperUser").cloned();
            inner.users.push(Principal {
                id: Uuid::new_v4(),
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: password::hash_password("admin123")
                    .unwrap_or_default(),
                is_active: true,
                role: superuser,
                created_at: Utc::now(),
                updated_at: None,
            });
        }
        store
    }

    /// Insert a user directly, for seeding and test fixtures.
    pub fn insert_user(&self, user: Principal) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.users.push(user);
    }

    /// Role lookup without going through the async trait, for seeding.
    pub fn role_named(&self, name: &str) -> Option<Role> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.roles.iter().find(|r| r.name == name).cloned()
    }

    /// How many principal lookups have hit this store. The gate must not
    /// touch the store when no token is presented; tests assert on this.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrincipalStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<Principal>, StoreError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner
            .users
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<Principal, StoreError> {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let role = new_user
            .role_id
            .and_then(|id| inner.roles.iter().find(|r| r.id == id).cloned());

        let user = Principal {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_active: new_user.is_active,
            role,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        update: UserUpdate,
    ) -> Result<Option<Principal>, StoreError> {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let role = update
            .role_id
            .and_then(|role_id| inner.roles.iter().find(|r| r.id == role_id).cloned());

        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        if role.is_some() {
            user.role = role;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Some(Utc::now());

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        Ok(inner.users.len() < before)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner.roles.clone())
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn permission(name: &str, description: &str) -> Permission {
    Permission {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: Some(description.to_string()),
    }
}

fn role(name: &str, description: &str, permissions: Vec<Permission>) -> Role {
    Role {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: Some(description.to_string()),
        permissions,
        created_at: Utc::now(),
    }
}

/// The default role/permission matrix from the database initializer.
fn default_roles() -> Vec<Role> {
    let all = |names: &[(&str, &str)]| -> Vec<Permission> {
        names.iter().map(|(n, d)| permission(n, d)).collect()
    };

    vec![
        role(
            "SuperUser",
            "Full system access with all permissions",
            all(&[
                ("user:read", "Read user information"),
                ("user:create", "Create new users"),
                ("user:update", "Update user information"),
                ("user:delete", "Delete users"),
                ("role:read", "Read role information"),
                ("role:create", "Create new roles"),
                ("role:update", "Update role information"),
                ("role:delete", "Delete roles"),
                ("permission:read", "Read permission information"),
                ("system:admin", "Full system administration access"),
                ("system:read", "Read system information"),
            ]),
        ),
        role(
            "Admin",
            "Administrative access with user and role management",
            all(&[
                ("user:read", "Read user information"),
                ("user:create", "Create new users"),
                ("user:update", "Update user information"),
                ("user:delete", "Delete users"),
                ("role:read", "Read role information"),
                ("permission:read", "Read permission information"),
                ("system:read", "Read system information"),
            ]),
        ),
        role(
            "Manager",
            "Manager access with limited user management",
            all(&[
                ("user:read", "Read user information"),
                ("user:create", "Create new users"),
                ("user:update", "Update user information"),
                ("system:read", "Read system information"),
            ]),
        ),
        role(
            "User",
            "Standard user access",
            all(&[
                ("user:read", "Read user information"),
                ("system:read", "Read system information"),
            ]),
        ),
        role(
            "Guest",
            "Limited read-only access",
            all(&[("system:read", "Read system information")]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_store_has_admin_with_superuser_role() {
        let store = MemoryUserStore::seeded();
        let admin = store.find_by_username("admin").await.unwrap().unwrap();

        assert!(admin.is_active);
        assert_eq!(admin.role_name(), Some("SuperUser"));
        assert!(crate::auth::resolver::has_permission(&admin, "user:delete"));
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = MemoryUserStore::seeded();
        let role = store.role_named("User").unwrap();

        let created = store
            .create_user(NewUser {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                password_hash: "x".to_string(),
                role_id: Some(role.id),
                is_active: true,
            })
            .await
            .unwrap();

        assert_eq!(created.role_name(), Some("User"));

        let updated = store
            .update_user(
                created.id,
                UserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.username, "bob");

        assert!(store.delete_user(created.id).await.unwrap());
        assert!(store.find_by_id(created.id).await.unwrap().is_none());
    }
}
