//! Branches (physical locations of a tenant).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comanda_core::{BranchId, TenantId};

/// A branch row (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    pub tenant_id: TenantId,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    /// The branch created at onboarding.
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a branch.
#[derive(Debug, Clone)]
pub struct NewBranch {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub is_main: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    Active,
    Inactive,
}

/// The branch shape held by the branch context and sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSummary {
    pub id: BranchId,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub status: BranchStatus,
}

impl From<&Branch> for BranchSummary {
    fn from(branch: &Branch) -> Self {
        Self {
            id: branch.id,
            name: branch.name.clone(),
            address: branch.address.clone(),
            city: branch.city.clone(),
            phone: branch.phone.clone(),
            status: if branch.is_active {
                BranchStatus::Active
            } else {
                BranchStatus::Inactive
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_maps_inactive_status() {
        let branch = Branch {
            id: BranchId::generate(),
            tenant_id: TenantId::generate(),
            name: "Centro".to_owned(),
            address: None,
            city: Some("Lima".to_owned()),
            phone: None,
            is_active: false,
            is_main: false,
            created_at: Utc::now(),
        };
        let summary = BranchSummary::from(&branch);
        assert_eq!(summary.status, BranchStatus::Inactive);
        assert_eq!(
            serde_json::to_value(&summary).unwrap()["status"],
            serde_json::json!("inactive")
        );
    }
}
