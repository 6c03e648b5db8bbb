use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Role;

/// A user identity as read from the store, with its role (and the role's
/// permissions) resolved eagerly.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.name.as_str())
    }
}
