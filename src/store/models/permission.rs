use uuid::Uuid;

/// An opaque grant name, `"<resource>:<action>"` by convention
/// (e.g. `user:read`). Unique within a role's grant set.
#[derive(Debug, Clone, PartialEq)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}
