use crate::domain::evaluator::GroupStatus;
use crate::domain::permission::Scope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query to get a role with its grant set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRoleQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
}

/// Query to list roles with filtering and pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRolesQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub page: u32,
    pub page_size: u32,
    pub name_filter: Option<String>,
}

/// Query to get a scheme, optionally with its four roles resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSchemeQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub scheme_id: String,
    pub include_roles: bool,
}

/// Query to list schemes with filtering and pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSchemesQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub page: u32,
    pub page_size: u32,
    pub name_filter: Option<String>,
}

/// Query to list the teams attached to a scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSchemeTeamsQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub scheme_id: String,
}

/// Query for the permission tree visible under a scope: groups with no
/// in-scope permission are pruned, rows carry display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPermissionTreeQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub scope: Scope,
}

/// Query for the tri-state statuses of every visible group for a role,
/// under a scope and an optional inherited scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetGroupStatusesQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
    pub scope: Scope,
    pub parent_role_id: Option<String>,
}

/// Paginated result wrapper for list queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

/// Read model for a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleReadModel {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub permissions: Vec<String>,
}

/// Read model for a scheme, with roles resolved when requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeReadModel {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub default_team_admin_role: String,
    pub default_team_user_role: String,
    pub default_channel_admin_role: String,
    pub default_channel_user_role: String,
    pub roles: Vec<RoleReadModel>,
}

/// A single permission row of the visible tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRowReadModel {
    pub code: String,
    pub display_name: String,
    pub scope: Scope,
}

/// A node of the visible tree: either a permission row or a nested group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNodeReadModel {
    Permission(PermissionRowReadModel),
    Group(TreeGroupReadModel),
}

/// A visible group with its surviving children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeGroupReadModel {
    pub id: String,
    pub combined: bool,
    pub children: Vec<TreeNodeReadModel>,
}

/// The scope-pruned tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionTreeReadModel {
    pub scope: Scope,
    pub groups: Vec<TreeGroupReadModel>,
}

/// Status of one visible group row for a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatusReadModel {
    pub group_id: String,
    pub status: GroupStatus,
    /// Every in-scope permission of the group is parent-inherited; the
    /// row renders locked.
    pub locked: bool,
}

/// Per-group statuses for a role under one scope/parent context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatusesReadModel {
    pub role_id: String,
    pub scope: Scope,
    pub groups: Vec<GroupStatusReadModel>,
}

/// Query factory stamping ids and timestamps.
pub struct QueryFactory;

impl QueryFactory {
    pub fn get_role(role_id: String) -> GetRoleQuery {
        GetRoleQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
        }
    }

    pub fn list_roles(page: u32, page_size: u32, name_filter: Option<String>) -> ListRolesQuery {
        ListRolesQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            page,
            page_size,
            name_filter,
        }
    }

    pub fn get_scheme(scheme_id: String, include_roles: bool) -> GetSchemeQuery {
        GetSchemeQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            scheme_id,
            include_roles,
        }
    }

    pub fn list_schemes(
        page: u32,
        page_size: u32,
        name_filter: Option<String>,
    ) -> ListSchemesQuery {
        ListSchemesQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            page,
            page_size,
            name_filter,
        }
    }

    pub fn list_scheme_teams(scheme_id: String) -> ListSchemeTeamsQuery {
        ListSchemeTeamsQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            scheme_id,
        }
    }

    pub fn get_permission_tree(scope: Scope) -> GetPermissionTreeQuery {
        GetPermissionTreeQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            scope,
        }
    }

    pub fn get_group_statuses(
        role_id: String,
        scope: Scope,
        parent_role_id: Option<String>,
    ) -> GetGroupStatusesQuery {
        GetGroupStatusesQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
            scope,
            parent_role_id,
        }
    }
}
