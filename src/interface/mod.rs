// Interface layer: HTTP API, controllers, DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateSchemeRequest {
    pub display_name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct PatchSchemeRequest {
    pub display_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub permissions: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RolesListResponse {
    pub roles: Vec<RoleResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SchemeResponse {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub default_team_admin_role: String,
    pub default_team_user_role: String,
    pub default_channel_admin_role: String,
    pub default_channel_user_role: String,
    pub roles: Vec<RoleResponse>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SchemesListResponse {
    pub schemes: Vec<SchemeResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct AttachTeamRequest {
    pub team_id: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SchemeTeamsResponse {
    pub scheme_id: String,
    pub teams: Vec<String>,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct EditRoleRequest {
    pub permissions: Vec<String>,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct SaveSchemeRolesRequest {
    pub all_members: Vec<String>,
    pub team_admin: Vec<String>,
    pub channel_admin: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PermissionRowResponse {
    pub code: String,
    pub display_name: String,
    pub scope: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNodeResponse {
    Permission(PermissionRowResponse),
    Group(TreeGroupResponse),
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TreeGroupResponse {
    pub id: String,
    pub combined: bool,
    pub children: Vec<TreeNodeResponse>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PermissionTreeResponse {
    pub scope: String,
    pub groups: Vec<TreeGroupResponse>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GroupStatusResponse {
    pub group_id: String,
    /// "checked", "intermediate" or "unchecked".
    pub status: String,
    pub locked: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GroupStatusesResponse {
    pub role_id: String,
    pub scope: String,
    pub groups: Vec<GroupStatusResponse>,
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct ToggleGroupRequest {
    pub scope: String,
    pub parent_role_id: Option<String>,
    /// Grant set remembered from the previous toggle on this group.
    #[serde(default)]
    pub memory: Vec<String>,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ToggleGroupResponse {
    pub role_id: String,
    pub group_id: String,
    pub toggled: Vec<String>,
    pub memory: Vec<String>,
    pub status: String,
    pub permissions: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod app_state;
pub mod http_handlers;

pub use app_state::AppState;
pub use http_handlers::{
    attach_team_handler, create_scheme_handler, delete_scheme_handler, detach_team_handler,
    edit_role_handler, get_group_statuses_handler, get_permission_tree_handler, get_role_handler,
    get_scheme_handler, list_roles_handler, list_scheme_teams_handler, list_schemes_handler,
    patch_scheme_handler, save_scheme_roles_handler, toggle_group_handler,
};
