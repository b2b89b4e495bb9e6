//! Staff roles.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name one of the six staff roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct StaffRoleError(pub String);

/// Role of a staff account within its tenant.
///
/// `Owner` and `Manager` may administer the tenant (institution codes, staff
/// roles and branch assignments); every other role is operational only.
///
/// Stored as the `console.staff_role` enum; queries cast it to and from text
/// and go through [`StaffRole::as_str`] and [`FromStr`](std::str::FromStr).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Created the tenant at onboarding; full control.
    Owner,
    /// Manages staff and codes, but cannot mint owners.
    Manager,
    Admin,
    Cashier,
    Kitchen,
    Delivery,
}

impl StaffRole {
    /// All roles, in privilege order.
    pub const ALL: [Self; 6] = [
        Self::Owner,
        Self::Manager,
        Self::Admin,
        Self::Cashier,
        Self::Kitchen,
        Self::Delivery,
    ];

    /// Returns true for roles allowed to administer the tenant.
    #[must_use]
    pub const fn can_manage(self) -> bool {
        matches!(self, Self::Owner | Self::Manager)
    }

    /// Returns true if a caller with this role may give `target` to someone.
    ///
    /// Only owners can hand out the owner role.
    #[must_use]
    pub const fn can_assign(self, target: Self) -> bool {
        match (self, target) {
            (Self::Owner, _) => true,
            (Self::Manager, Self::Owner) => false,
            (Self::Manager, _) => true,
            _ => false,
        }
    }

    /// The snake-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Cashier => "cashier",
            Self::Kitchen => "kitchen",
            Self::Delivery => "delivery",
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StaffRole {
    type Err = StaffRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| StaffRoleError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_roles() {
        for role in StaffRole::ALL {
            assert_eq!(role.as_str().parse::<StaffRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Owner".parse::<StaffRole>().is_err());
        assert!("superadmin".parse::<StaffRole>().is_err());
    }

    #[test]
    fn test_can_manage() {
        let managing: Vec<_> = StaffRole::ALL
            .into_iter()
            .filter(|r| r.can_manage())
            .collect();
        assert_eq!(managing, vec![StaffRole::Owner, StaffRole::Manager]);
    }

    #[test]
    fn test_manager_cannot_assign_owner() {
        assert!(!StaffRole::Manager.can_assign(StaffRole::Owner));
        assert!(StaffRole::Manager.can_assign(StaffRole::Manager));
        assert!(StaffRole::Manager.can_assign(StaffRole::Delivery));
        assert!(StaffRole::Owner.can_assign(StaffRole::Owner));
        assert!(!StaffRole::Cashier.can_assign(StaffRole::Cashier));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&StaffRole::Kitchen).unwrap();
        assert_eq!(json, "\"kitchen\"");
    }
}
