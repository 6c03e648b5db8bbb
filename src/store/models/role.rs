use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Permission;

/// A named collection of permissions, assigned to users one-to-many.
/// The permission set is a read-consistent snapshot for the request that
/// loaded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}
