use crate::domain::permission::{LicenseTier, PermissionCatalog};
use crate::domain::permission_tree::PermissionTree;
use crate::domain::role::Role;
use crate::domain::scheme::{AllMembersSplit, combine_all_members, split_all_members};
use std::sync::Arc;
use tracing::info;

/// Error taxonomy shared by the command and query handlers.
#[derive(Debug, thiserror::Error)]
pub enum SchemeError {
    #[error("Role not found")]
    RoleNotFound,
    #[error("Scheme not found")]
    SchemeNotFound,
    #[error("Permission group not found")]
    GroupNotFound,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Database error")]
    DatabaseError,
}

/// The licensing feature gate. The permission taxonomy an installation
/// shows depends on its license tier; everything downstream asks this
/// service for the tree instead of building one ad hoc.
pub struct LicenseService {
    tier: LicenseTier,
}

impl LicenseService {
    pub fn new(tier: LicenseTier) -> Self {
        info!(tier = ?tier, "License gate initialized");
        Self { tier }
    }

    pub fn tier(&self) -> LicenseTier {
        self.tier
    }

    /// The taxonomy for this installation's tier.
    pub fn permission_tree(&self) -> PermissionTree {
        PermissionTree::standard(self.tier)
    }
}

/// Orchestrates the all-members combine/split rules of the scheme screen.
pub struct SchemeService {
    catalog: Arc<PermissionCatalog>,
}

impl SchemeService {
    pub fn new(catalog: Arc<PermissionCatalog>) -> Self {
        Self { catalog }
    }

    /// The team-user and channel-user roles presented as one editable list.
    pub fn combine_all_members(&self, team_user: &Role, channel_user: &Role) -> Vec<String> {
        combine_all_members(team_user, channel_user)
    }

    /// An edited all-members list split back into per-role grant sets.
    pub fn split_all_members(&self, permissions: &[String]) -> AllMembersSplit {
        split_all_members(&self.catalog, permissions)
    }

    /// Drops codes the catalog does not define; unknown codes are excluded,
    /// never rejected.
    pub fn retain_known(&self, permissions: Vec<String>) -> Vec<String> {
        permissions
            .into_iter()
            .filter(|code| self.catalog.contains(code))
            .collect()
    }
}
