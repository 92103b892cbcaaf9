//! Resolved customer identity and roles.

use serde::{Deserialize, Serialize};

/// Permission level of a resolved identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Regular storefront customer.
    #[default]
    Customer,

    /// Catalog and order administrator.
    Admin,
}

impl Role {
    /// Returns true for the admin role.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The identity resolved for a request by the session subsystem.
///
/// The order core never resolves sessions itself; it receives this value
/// already authenticated and only inspects the username and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Login name, the ownership key for orders.
    pub username: String,

    /// Display name snapshotted onto orders.
    pub name: String,

    /// Email address snapshotted onto orders.
    pub email: String,

    /// Permission level.
    pub role: Role,
}

impl Identity {
    /// Creates a customer identity.
    pub fn customer(
        username: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
            email: email.into(),
            role: Role::Customer,
        }
    }

    /// Creates an admin identity.
    pub fn admin(
        username: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
            email: email.into(),
            role: Role::Admin,
        }
    }

    /// Returns true if this identity carries the admin role.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_is_not_admin() {
        let id = Identity::customer("alice", "Alice A.", "alice@example.com");
        assert!(!id.is_admin());
        assert_eq!(id.role, Role::Customer);
    }

    #[test]
    fn admin_is_admin() {
        let id = Identity::admin("root", "Root", "root@example.com");
        assert!(id.is_admin());
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::Customer.to_string(), "Customer");
        assert_eq!(Role::Admin.to_string(), "Admin");
    }
}
