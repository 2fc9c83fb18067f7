//! User roles and permission predicates.
//!
//! Every authorization decision in the backend is a comparison against this
//! enum. Roles are stored in Postgres as the `user_role` enum type.

use serde::{Deserialize, Serialize};

/// Account role, ordered roughly by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to everything.
    Admin,
    /// Catalog and order management.
    Manager,
    /// Order fulfilment and support handling.
    Staff,
    /// Regular shopper.
    #[default]
    Customer,
}

impl Role {
    /// Staff, manager, or admin. Gates order status updates and ticket triage.
    #[must_use]
    pub const fn is_staff_or_above(self) -> bool {
        matches!(self, Self::Admin | Self::Manager | Self::Staff)
    }

    /// Admin or manager. Gates catalog writes.
    #[must_use]
    pub const fn can_manage_catalog(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Admin or staff. Gates the "see everything" support queues and
    /// lab-support-limit writes.
    #[must_use]
    pub const fn is_support_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Staff)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Manager => write!(f, "manager"),
            Self::Staff => write!(f, "staff"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "staff" => Ok(Self::Staff),
            "customer" => Ok(Self::Customer),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_predicates() {
        assert!(Role::Admin.is_staff_or_above());
        assert!(Role::Manager.is_staff_or_above());
        assert!(Role::Staff.is_staff_or_above());
        assert!(!Role::Customer.is_staff_or_above());

        assert!(Role::Admin.can_manage_catalog());
        assert!(Role::Manager.can_manage_catalog());
        assert!(!Role::Staff.can_manage_catalog());
        assert!(!Role::Customer.can_manage_catalog());

        assert!(Role::Admin.is_support_staff());
        assert!(Role::Staff.is_support_staff());
        assert!(!Role::Manager.is_support_staff());
        assert!(!Role::Customer.is_support_staff());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::Staff, Role::Customer] {
            let parsed: Role = role.to_string().parse().expect("parse role");
            assert_eq!(parsed, role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::Staff).expect("serialize");
        assert_eq!(json, "\"staff\"");
        let back: Role = serde_json::from_str("\"customer\"").expect("deserialize");
        assert_eq!(back, Role::Customer);
    }
}
