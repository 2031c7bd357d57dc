use crate::domain::permission::Scope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to create a team override scheme (provisions its four roles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSchemeCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub display_name: String,
    pub description: Option<String>,
}

/// Command to update a scheme's display name and description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchSchemeCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub scheme_id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// Command to delete a scheme and its role attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSchemeCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub scheme_id: String,
}

/// Command to put a team under a scheme's permission overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachTeamToSchemeCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub scheme_id: String,
    pub team_id: String,
}

/// Command to release a team from a scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetachTeamFromSchemeCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub scheme_id: String,
    pub team_id: String,
}

/// Command to replace a role's grant set wholesale. Codes the catalog does
/// not know are dropped, never rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRolePermissionsCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
    pub permissions: Vec<String>,
}

/// Command to save a scheme screen: the edited all-members list is split
/// by declared scope into the team-user and channel-user roles, and the
/// two admin roles are saved as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSchemeRolesCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub scheme_id: String,
    pub all_members: Vec<String>,
    pub team_admin: Vec<String>,
    pub channel_admin: Vec<String>,
}

/// Command for the toggle-all gesture on one tree group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TogglePermissionGroupCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
    pub group_id: String,
    pub scope: Scope,
    pub parent_role_id: Option<String>,
    /// Grant set remembered from the previous toggle on this group.
    pub memory: Vec<String>,
    /// Set by the caller when the surrounding screen is not editable.
    pub read_only: bool,
}

/// Command factory stamping ids and timestamps.
pub struct CommandFactory;

impl CommandFactory {
    pub fn create_scheme(display_name: String, description: Option<String>) -> CreateSchemeCommand {
        CreateSchemeCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            display_name,
            description,
        }
    }

    pub fn patch_scheme(
        scheme_id: String,
        display_name: Option<String>,
        description: Option<String>,
    ) -> PatchSchemeCommand {
        PatchSchemeCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            scheme_id,
            display_name,
            description,
        }
    }

    pub fn delete_scheme(scheme_id: String) -> DeleteSchemeCommand {
        DeleteSchemeCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            scheme_id,
        }
    }

    pub fn attach_team_to_scheme(scheme_id: String, team_id: String) -> AttachTeamToSchemeCommand {
        AttachTeamToSchemeCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            scheme_id,
            team_id,
        }
    }

    pub fn detach_team_from_scheme(
        scheme_id: String,
        team_id: String,
    ) -> DetachTeamFromSchemeCommand {
        DetachTeamFromSchemeCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            scheme_id,
            team_id,
        }
    }

    pub fn edit_role_permissions(
        role_id: String,
        permissions: Vec<String>,
    ) -> EditRolePermissionsCommand {
        EditRolePermissionsCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
            permissions,
        }
    }

    pub fn save_scheme_roles(
        scheme_id: String,
        all_members: Vec<String>,
        team_admin: Vec<String>,
        channel_admin: Vec<String>,
    ) -> SaveSchemeRolesCommand {
        SaveSchemeRolesCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            scheme_id,
            all_members,
            team_admin,
            channel_admin,
        }
    }

    pub fn toggle_permission_group(
        role_id: String,
        group_id: String,
        scope: Scope,
        parent_role_id: Option<String>,
        memory: Vec<String>,
        read_only: bool,
    ) -> TogglePermissionGroupCommand {
        TogglePermissionGroupCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
            group_id,
            scope,
            parent_role_id,
            memory,
            read_only,
        }
    }
}
