use crate::application::command_handlers::GroupToggleOutcome;
use crate::application::commands::CommandFactory;
use crate::application::queries::{
    GroupStatusesReadModel, PaginatedResult, PermissionRowReadModel, PermissionTreeReadModel,
    QueryFactory, RoleReadModel, SchemeReadModel, TreeGroupReadModel, TreeNodeReadModel,
};
use crate::application::services::SchemeError;
use crate::domain::permission::Scope;
use crate::domain::role::Role;
use crate::domain::scheme::PermissionScheme;
use crate::interface::app_state::AppState;
use crate::interface::{
    AttachTeamRequest, CreateSchemeRequest, EditRoleRequest, ErrorResponse, GroupStatusResponse,
    GroupStatusesResponse, PatchSchemeRequest, PermissionRowResponse, PermissionTreeResponse,
    RoleResponse, RolesListResponse, SaveSchemeRolesRequest, SchemeResponse, SchemeTeamsResponse,
    SchemesListResponse, ToggleGroupRequest, ToggleGroupResponse, TreeGroupResponse,
    TreeNodeResponse,
};
use axum::Json;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

/// Identifies the console operator driving a mutating request.
pub struct RequireAdmin {
    pub admin_id: String,
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin_id = parts
            .headers
            .get("x-admin-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing admin id"))?;
        Ok(RequireAdmin { admin_id })
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ScopeParams {
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct StatusParams {
    pub scope: Option<String>,
    pub parent_role_id: Option<String>,
}

fn parse_scope(scope: Option<&str>) -> Result<Scope, Response> {
    scope.unwrap_or("system_scope").parse().map_err(|e: String| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response()
    })
}

fn error_response(e: Box<dyn std::error::Error + Send + Sync>) -> Response {
    let (status_code, error_message) = if let Ok(scheme_error) = e.downcast::<SchemeError>() {
        match *scheme_error {
            SchemeError::RoleNotFound => (StatusCode::NOT_FOUND, "Role not found".to_string()),
            SchemeError::SchemeNotFound => (StatusCode::NOT_FOUND, "Scheme not found".to_string()),
            SchemeError::GroupNotFound => (
                StatusCode::NOT_FOUND,
                "Permission group not found".to_string(),
            ),
            SchemeError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            SchemeError::DatabaseError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        }
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };
    (
        status_code,
        Json(ErrorResponse {
            error: error_message,
        }),
    )
        .into_response()
}

fn invalid_result_response(context: &'static str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, context).into_response()
}

fn role_response(role: RoleReadModel) -> RoleResponse {
    RoleResponse {
        id: role.id,
        name: role.name,
        display_name: role.display_name,
        permissions: role.permissions,
    }
}

fn scheme_response(scheme: SchemeReadModel) -> SchemeResponse {
    SchemeResponse {
        id: scheme.id,
        display_name: scheme.display_name,
        description: scheme.description,
        default_team_admin_role: scheme.default_team_admin_role,
        default_team_user_role: scheme.default_team_user_role,
        default_channel_admin_role: scheme.default_channel_admin_role,
        default_channel_user_role: scheme.default_channel_user_role,
        roles: scheme.roles.into_iter().map(role_response).collect(),
    }
}

fn tree_group_response(group: TreeGroupReadModel) -> TreeGroupResponse {
    TreeGroupResponse {
        id: group.id,
        combined: group.combined,
        children: group
            .children
            .into_iter()
            .map(|child| match child {
                TreeNodeReadModel::Permission(row) => {
                    TreeNodeResponse::Permission(permission_row_response(row))
                }
                TreeNodeReadModel::Group(nested) => {
                    TreeNodeResponse::Group(tree_group_response(nested))
                }
            })
            .collect(),
    }
}

fn permission_row_response(row: PermissionRowReadModel) -> PermissionRowResponse {
    PermissionRowResponse {
        code: row.code,
        display_name: row.display_name,
        scope: row.scope.as_str().to_string(),
    }
}

// --- SCHEME HANDLERS ---

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/admin/schemes",
    request_body = CreateSchemeRequest,
    responses(
        (status = 200, description = "Scheme created", body = SchemeResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
    ),
    tags = ["Schemes"],
    description = "Create a team override scheme and provision its four default roles."
)]
pub async fn create_scheme_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin { admin_id }: RequireAdmin,
    Json(payload): Json<CreateSchemeRequest>,
) -> impl IntoResponse {
    tracing::info!(admin_id = %admin_id, "Creating scheme");
    let cmd = CommandFactory::create_scheme(payload.display_name, payload.description);

    match state.command_bus.execute(cmd).await {
        Ok(result_box) => {
            if let Ok(scheme) = result_box.downcast::<PermissionScheme>() {
                Json(SchemeResponse {
                    id: scheme.id,
                    display_name: scheme.display_name,
                    description: scheme.description,
                    default_team_admin_role: scheme.default_team_admin_role,
                    default_team_user_role: scheme.default_team_user_role,
                    default_channel_admin_role: scheme.default_channel_admin_role,
                    default_channel_user_role: scheme.default_channel_user_role,
                    roles: vec![],
                })
                .into_response()
            } else {
                invalid_result_response("Invalid result type from create scheme command")
            }
        }
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/admin/schemes",
    params(ListParams),
    responses(
        (status = 200, description = "Schemes listed", body = SchemesListResponse),
    ),
    tags = ["Schemes"],
    description = "List team override schemes with pagination and name filtering."
)]
pub async fn list_schemes_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let query = QueryFactory::list_schemes(
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(50),
        params.name,
    );

    match state.query_bus.execute(query).await {
        Ok(result_box) => {
            if let Ok(result) = result_box.downcast::<PaginatedResult<SchemeReadModel>>() {
                let result = *result;
                Json(SchemesListResponse {
                    schemes: result.items.into_iter().map(scheme_response).collect(),
                    page: result.page,
                    page_size: result.page_size,
                    total: result.total,
                })
                .into_response()
            } else {
                invalid_result_response("Invalid result type from list schemes query")
            }
        }
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/admin/schemes/{scheme_id}",
    responses(
        (status = 200, description = "Scheme retrieved", body = SchemeResponse),
        (status = 404, description = "Scheme not found", body = ErrorResponse),
    ),
    tags = ["Schemes"],
    description = "Get a scheme with its four roles resolved."
)]
pub async fn get_scheme_handler(
    State(state): State<Arc<AppState>>,
    Path(scheme_id): Path<String>,
) -> impl IntoResponse {
    let query = QueryFactory::get_scheme(scheme_id, true);

    match state.query_bus.execute(query).await {
        Ok(result_box) => {
            if let Ok(result) = result_box.downcast::<Option<SchemeReadModel>>() {
                match *result {
                    Some(scheme) => Json(scheme_response(scheme)).into_response(),
                    None => (
                        StatusCode::NOT_FOUND,
                        Json(ErrorResponse {
                            error: "Scheme not found".to_string(),
                        }),
                    )
                        .into_response(),
                }
            } else {
                invalid_result_response("Invalid result type from get scheme query")
            }
        }
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    put,
    path = "/v1/admin/schemes/{scheme_id}",
    request_body = PatchSchemeRequest,
    responses(
        (status = 200, description = "Scheme updated"),
        (status = 404, description = "Scheme not found", body = ErrorResponse),
    ),
    tags = ["Schemes"],
    description = "Update a scheme's display name and description."
)]
pub async fn patch_scheme_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin { admin_id }: RequireAdmin,
    Path(scheme_id): Path<String>,
    Json(payload): Json<PatchSchemeRequest>,
) -> impl IntoResponse {
    tracing::info!(admin_id = %admin_id, scheme_id = %scheme_id, "Patching scheme");
    let cmd = CommandFactory::patch_scheme(scheme_id, payload.display_name, payload.description);

    match state.command_bus.execute(cmd).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    delete,
    path = "/v1/admin/schemes/{scheme_id}",
    responses(
        (status = 200, description = "Scheme deleted"),
        (status = 404, description = "Scheme not found", body = ErrorResponse),
    ),
    tags = ["Schemes"],
    description = "Delete a scheme, its roles and its team attachments."
)]
pub async fn delete_scheme_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin { admin_id }: RequireAdmin,
    Path(scheme_id): Path<String>,
) -> impl IntoResponse {
    tracing::info!(admin_id = %admin_id, scheme_id = %scheme_id, "Deleting scheme");
    let cmd = CommandFactory::delete_scheme(scheme_id);

    match state.command_bus.execute(cmd).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/admin/schemes/{scheme_id}/teams",
    request_body = AttachTeamRequest,
    responses(
        (status = 200, description = "Team attached"),
        (status = 404, description = "Scheme not found", body = ErrorResponse),
    ),
    tags = ["Schemes"],
    description = "Put a team under this scheme's permission overrides."
)]
pub async fn attach_team_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin { admin_id }: RequireAdmin,
    Path(scheme_id): Path<String>,
    Json(payload): Json<AttachTeamRequest>,
) -> impl IntoResponse {
    tracing::info!(admin_id = %admin_id, scheme_id = %scheme_id, team_id = %payload.team_id, "Attaching team to scheme");
    let cmd = CommandFactory::attach_team_to_scheme(scheme_id, payload.team_id);

    match state.command_bus.execute(cmd).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    delete,
    path = "/v1/admin/schemes/{scheme_id}/teams/{team_id}",
    responses(
        (status = 200, description = "Team detached"),
    ),
    tags = ["Schemes"],
    description = "Release a team from this scheme."
)]
pub async fn detach_team_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin { admin_id }: RequireAdmin,
    Path((scheme_id, team_id)): Path<(String, String)>,
) -> impl IntoResponse {
    tracing::info!(admin_id = %admin_id, scheme_id = %scheme_id, team_id = %team_id, "Detaching team from scheme");
    let cmd = CommandFactory::detach_team_from_scheme(scheme_id, team_id);

    match state.command_bus.execute(cmd).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/admin/schemes/{scheme_id}/teams",
    responses(
        (status = 200, description = "Scheme teams listed", body = SchemeTeamsResponse),
        (status = 404, description = "Scheme not found", body = ErrorResponse),
    ),
    tags = ["Schemes"],
    description = "List the teams attached to a scheme."
)]
pub async fn list_scheme_teams_handler(
    State(state): State<Arc<AppState>>,
    Path(scheme_id): Path<String>,
) -> impl IntoResponse {
    let query = QueryFactory::list_scheme_teams(scheme_id.clone());

    match state.query_bus.execute(query).await {
        Ok(result_box) => {
            if let Ok(teams) = result_box.downcast::<Vec<String>>() {
                Json(SchemeTeamsResponse {
                    scheme_id,
                    teams: *teams,
                })
                .into_response()
            } else {
                invalid_result_response("Invalid result type from list scheme teams query")
            }
        }
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    put,
    path = "/v1/admin/schemes/{scheme_id}/roles",
    request_body = SaveSchemeRolesRequest,
    responses(
        (status = 200, description = "Scheme roles saved"),
        (status = 404, description = "Scheme not found", body = ErrorResponse),
    ),
    tags = ["Schemes"],
    description = "Save the scheme screen: splits the all-members list by scope into the team-user and channel-user roles."
)]
pub async fn save_scheme_roles_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin { admin_id }: RequireAdmin,
    Path(scheme_id): Path<String>,
    Json(payload): Json<SaveSchemeRolesRequest>,
) -> impl IntoResponse {
    tracing::info!(admin_id = %admin_id, scheme_id = %scheme_id, "Saving scheme roles");
    let cmd = CommandFactory::save_scheme_roles(
        scheme_id,
        payload.all_members,
        payload.team_admin,
        payload.channel_admin,
    );

    match state.command_bus.execute(cmd).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => error_response(e),
    }
}

// --- ROLE HANDLERS ---

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/admin/roles",
    params(ListParams),
    responses(
        (status = 200, description = "Roles listed", body = RolesListResponse),
    ),
    tags = ["Roles"],
    description = "List roles with pagination and name filtering."
)]
pub async fn list_roles_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let query = QueryFactory::list_roles(
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(50),
        params.name,
    );

    match state.query_bus.execute(query).await {
        Ok(result_box) => {
            if let Ok(result) = result_box.downcast::<PaginatedResult<RoleReadModel>>() {
                let result = *result;
                Json(RolesListResponse {
                    roles: result.items.into_iter().map(role_response).collect(),
                    page: result.page,
                    page_size: result.page_size,
                    total: result.total,
                })
                .into_response()
            } else {
                invalid_result_response("Invalid result type from list roles query")
            }
        }
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/admin/roles/{role_id}",
    responses(
        (status = 200, description = "Role retrieved", body = RoleResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
    ),
    tags = ["Roles"],
    description = "Get a role with its grant set."
)]
pub async fn get_role_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
) -> impl IntoResponse {
    let query = QueryFactory::get_role(role_id);

    match state.query_bus.execute(query).await {
        Ok(result_box) => {
            if let Ok(result) = result_box.downcast::<Option<RoleReadModel>>() {
                match *result {
                    Some(role) => Json(role_response(role)).into_response(),
                    None => (
                        StatusCode::NOT_FOUND,
                        Json(ErrorResponse {
                            error: "Role not found".to_string(),
                        }),
                    )
                        .into_response(),
                }
            } else {
                invalid_result_response("Invalid result type from get role query")
            }
        }
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    put,
    path = "/v1/admin/roles/{role_id}",
    request_body = EditRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
    ),
    tags = ["Roles"],
    description = "Replace a role's grant set. Unknown permission codes are dropped."
)]
pub async fn edit_role_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin { admin_id }: RequireAdmin,
    Path(role_id): Path<String>,
    Json(payload): Json<EditRoleRequest>,
) -> impl IntoResponse {
    tracing::info!(admin_id = %admin_id, role_id = %role_id, "Editing role permissions");
    let cmd = CommandFactory::edit_role_permissions(role_id, payload.permissions);

    match state.command_bus.execute(cmd).await {
        Ok(result_box) => {
            if let Ok(role) = result_box.downcast::<Role>() {
                Json(RoleResponse {
                    id: role.id,
                    name: role.name,
                    display_name: role.display_name,
                    permissions: role.permissions,
                })
                .into_response()
            } else {
                invalid_result_response("Invalid result type from edit role command")
            }
        }
        Err(e) => error_response(e),
    }
}

// --- PERMISSION TREE HANDLERS ---

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/admin/permissions/tree",
    params(ScopeParams),
    responses(
        (status = 200, description = "Visible permission tree", body = PermissionTreeResponse),
        (status = 400, description = "Unknown scope", body = ErrorResponse),
    ),
    tags = ["Permissions"],
    description = "The permission taxonomy visible under a scope; groups with no in-scope permission are pruned."
)]
pub async fn get_permission_tree_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScopeParams>,
) -> impl IntoResponse {
    let scope = match parse_scope(params.scope.as_deref()) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let query = QueryFactory::get_permission_tree(scope);

    match state.query_bus.execute(query).await {
        Ok(result_box) => {
            if let Ok(tree) = result_box.downcast::<PermissionTreeReadModel>() {
                let tree = *tree;
                Json(PermissionTreeResponse {
                    scope: tree.scope.as_str().to_string(),
                    groups: tree.groups.into_iter().map(tree_group_response).collect(),
                })
                .into_response()
            } else {
                invalid_result_response("Invalid result type from get permission tree query")
            }
        }
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/admin/roles/{role_id}/group-statuses",
    params(StatusParams),
    responses(
        (status = 200, description = "Group statuses", body = GroupStatusesResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
    ),
    tags = ["Permissions"],
    description = "Tri-state status and lock state of every visible group for a role, optionally under an inherited scheme."
)]
pub async fn get_group_statuses_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
    Query(params): Query<StatusParams>,
) -> impl IntoResponse {
    let scope = match parse_scope(params.scope.as_deref()) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let query = QueryFactory::get_group_statuses(role_id, scope, params.parent_role_id);

    match state.query_bus.execute(query).await {
        Ok(result_box) => {
            if let Ok(statuses) = result_box.downcast::<GroupStatusesReadModel>() {
                let statuses = *statuses;
                Json(GroupStatusesResponse {
                    role_id: statuses.role_id,
                    scope: statuses.scope.as_str().to_string(),
                    groups: statuses
                        .groups
                        .into_iter()
                        .map(|g| GroupStatusResponse {
                            group_id: g.group_id,
                            status: g.status.as_str().to_string(),
                            locked: g.locked,
                        })
                        .collect(),
                })
                .into_response()
            } else {
                invalid_result_response("Invalid result type from get group statuses query")
            }
        }
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/admin/roles/{role_id}/groups/{group_id}/toggle",
    request_body = ToggleGroupRequest,
    responses(
        (status = 200, description = "Group toggled", body = ToggleGroupResponse),
        (status = 404, description = "Role or group not found", body = ErrorResponse),
        (status = 400, description = "Unknown scope", body = ErrorResponse),
    ),
    tags = ["Permissions"],
    description = "Toggle-all on one tree group: flips the returned codes on the role and hands back the memory for the next toggle."
)]
pub async fn toggle_group_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin { admin_id }: RequireAdmin,
    Path((role_id, group_id)): Path<(String, String)>,
    Json(payload): Json<ToggleGroupRequest>,
) -> impl IntoResponse {
    let scope = match parse_scope(Some(&payload.scope)) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    tracing::info!(admin_id = %admin_id, role_id = %role_id, group_id = %group_id, "Toggling permission group");
    let cmd = CommandFactory::toggle_permission_group(
        role_id,
        group_id,
        scope,
        payload.parent_role_id,
        payload.memory,
        payload.read_only,
    );

    match state.command_bus.execute(cmd).await {
        Ok(result_box) => {
            if let Ok(outcome) = result_box.downcast::<GroupToggleOutcome>() {
                let outcome = *outcome;
                Json(ToggleGroupResponse {
                    role_id: outcome.role_id,
                    group_id: outcome.group_id,
                    toggled: outcome.toggled,
                    memory: outcome.memory,
                    status: outcome.status.as_str().to_string(),
                    permissions: outcome.permissions,
                })
                .into_response()
            } else {
                invalid_result_response("Invalid result type from toggle group command")
            }
        }
        Err(e) => error_response(e),
    }
}
