use std::collections::HashSet;

use crate::store::models::Principal;

/// Flattened permission names granted to a principal through its role.
/// Empty when no role is assigned. Computed fresh per request so checks
/// always reflect the store snapshot they were resolved from.
pub fn permissions(principal: &Principal) -> HashSet<String> {
    match &principal.role {
        Some(role) => role.permissions.iter().map(|p| p.name.clone()).collect(),
        None => HashSet::new(),
    }
}

/// Whether the principal's role grants the named permission.
pub fn has_permission(principal: &Principal, name: &str) -> bool {
    match &principal.role {
        Some(role) => role.permissions.iter().any(|p| p.name == name),
        None => false,
    }
}

/// Whether the principal's role name is one of the given names.
/// Exact, case-sensitive comparison.
pub fn has_any_role(principal: &Principal, role_names: &[&str]) -> bool {
    match &principal.role {
        Some(role) => role_names.contains(&role.name.as_str()),
        None => false,
    }
}
