use super::queries::{
    GetGroupStatusesQuery, GetPermissionTreeQuery, GetRoleQuery, GetSchemeQuery,
    GroupStatusReadModel, GroupStatusesReadModel, ListRolesQuery, ListSchemeTeamsQuery,
    ListSchemesQuery, PaginatedResult, PermissionRowReadModel, PermissionTreeReadModel,
    RoleReadModel, SchemeReadModel, TreeGroupReadModel, TreeNodeReadModel,
};
use super::query_bus::QueryHandler;
use super::services::{LicenseService, SchemeError};
use crate::domain::evaluator::TreeEvaluator;
use crate::domain::permission::PermissionCatalog;
use crate::domain::permission_tree::{PermissionGroupNode, PermissionNode};
use crate::domain::role::Role;
use crate::infrastructure::{RoleRepository, SchemeRepository};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

// ============================================================================
// QUERY HANDLERS
// ============================================================================

fn role_read_model(role: Role) -> RoleReadModel {
    RoleReadModel {
        id: role.id,
        name: role.name,
        display_name: role.display_name,
        permissions: role.permissions,
    }
}

fn paginate<T>(items: Vec<T>, page: u32, page_size: u32) -> PaginatedResult<T> {
    let total = items.len() as u64;
    let page = page.max(1);
    let page_size = page_size.max(1);
    let start = ((page - 1) * page_size) as usize;
    let items = items
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();
    PaginatedResult {
        items,
        page,
        page_size,
        total,
    }
}

/// Get role query handler
pub struct GetRoleQueryHandler {
    role_repo: Arc<dyn RoleRepository>,
}

impl GetRoleQueryHandler {
    pub fn new(role_repo: Arc<dyn RoleRepository>) -> Self {
        Self { role_repo }
    }
}

#[async_trait]
impl QueryHandler<GetRoleQuery> for GetRoleQueryHandler {
    type Result = Option<RoleReadModel>;
    type Error = SchemeError;

    #[instrument(name = "get_role_query_handler", skip(self, query))]
    async fn handle(&self, query: GetRoleQuery) -> Result<Self::Result, Self::Error> {
        let role = self
            .role_repo
            .find_by_id(&query.role_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?;
        Ok(role.map(role_read_model))
    }
}

/// List roles query handler
pub struct ListRolesQueryHandler {
    role_repo: Arc<dyn RoleRepository>,
}

impl ListRolesQueryHandler {
    pub fn new(role_repo: Arc<dyn RoleRepository>) -> Self {
        Self { role_repo }
    }
}

#[async_trait]
impl QueryHandler<ListRolesQuery> for ListRolesQueryHandler {
    type Result = PaginatedResult<RoleReadModel>;
    type Error = SchemeError;

    #[instrument(name = "list_roles_query_handler", skip(self, query))]
    async fn handle(&self, query: ListRolesQuery) -> Result<Self::Result, Self::Error> {
        let mut roles = self
            .role_repo
            .list_roles()
            .await
            .map_err(|_| SchemeError::DatabaseError)?;
        if let Some(filter) = &query.name_filter {
            let filter = filter.to_lowercase();
            roles.retain(|r| r.name.to_lowercase().contains(&filter));
        }
        let models = roles.into_iter().map(role_read_model).collect();
        Ok(paginate(models, query.page, query.page_size))
    }
}

/// Get scheme query handler
pub struct GetSchemeQueryHandler {
    scheme_repo: Arc<dyn SchemeRepository>,
    role_repo: Arc<dyn RoleRepository>,
}

impl GetSchemeQueryHandler {
    pub fn new(
        scheme_repo: Arc<dyn SchemeRepository>,
        role_repo: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            scheme_repo,
            role_repo,
        }
    }
}

#[async_trait]
impl QueryHandler<GetSchemeQuery> for GetSchemeQueryHandler {
    type Result = Option<SchemeReadModel>;
    type Error = SchemeError;

    #[instrument(name = "get_scheme_query_handler", skip(self, query))]
    async fn handle(&self, query: GetSchemeQuery) -> Result<Self::Result, Self::Error> {
        let Some(scheme) = self
            .scheme_repo
            .find_by_id(&query.scheme_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?
        else {
            return Ok(None);
        };

        let mut roles = Vec::new();
        if query.include_roles {
            for role_id in [
                &scheme.default_team_admin_role,
                &scheme.default_team_user_role,
                &scheme.default_channel_admin_role,
                &scheme.default_channel_user_role,
            ] {
                if let Some(role) = self
                    .role_repo
                    .find_by_id(role_id)
                    .await
                    .map_err(|_| SchemeError::DatabaseError)?
                {
                    roles.push(role_read_model(role));
                }
            }
        }

        Ok(Some(SchemeReadModel {
            id: scheme.id,
            display_name: scheme.display_name,
            description: scheme.description,
            default_team_admin_role: scheme.default_team_admin_role,
            default_team_user_role: scheme.default_team_user_role,
            default_channel_admin_role: scheme.default_channel_admin_role,
            default_channel_user_role: scheme.default_channel_user_role,
            roles,
        }))
    }
}

/// List schemes query handler
pub struct ListSchemesQueryHandler {
    scheme_repo: Arc<dyn SchemeRepository>,
}

impl ListSchemesQueryHandler {
    pub fn new(scheme_repo: Arc<dyn SchemeRepository>) -> Self {
        Self { scheme_repo }
    }
}

#[async_trait]
impl QueryHandler<ListSchemesQuery> for ListSchemesQueryHandler {
    type Result = PaginatedResult<SchemeReadModel>;
    type Error = SchemeError;

    #[instrument(name = "list_schemes_query_handler", skip(self, query))]
    async fn handle(&self, query: ListSchemesQuery) -> Result<Self::Result, Self::Error> {
        let mut schemes = self
            .scheme_repo
            .list_schemes()
            .await
            .map_err(|_| SchemeError::DatabaseError)?;
        if let Some(filter) = &query.name_filter {
            let filter = filter.to_lowercase();
            schemes.retain(|s| s.display_name.to_lowercase().contains(&filter));
        }
        let models = schemes
            .into_iter()
            .map(|scheme| SchemeReadModel {
                id: scheme.id,
                display_name: scheme.display_name,
                description: scheme.description,
                default_team_admin_role: scheme.default_team_admin_role,
                default_team_user_role: scheme.default_team_user_role,
                default_channel_admin_role: scheme.default_channel_admin_role,
                default_channel_user_role: scheme.default_channel_user_role,
                roles: vec![],
            })
            .collect();
        Ok(paginate(models, query.page, query.page_size))
    }
}

/// List scheme teams query handler
pub struct ListSchemeTeamsQueryHandler {
    scheme_repo: Arc<dyn SchemeRepository>,
}

impl ListSchemeTeamsQueryHandler {
    pub fn new(scheme_repo: Arc<dyn SchemeRepository>) -> Self {
        Self { scheme_repo }
    }
}

#[async_trait]
impl QueryHandler<ListSchemeTeamsQuery> for ListSchemeTeamsQueryHandler {
    type Result = Vec<String>;
    type Error = SchemeError;

    #[instrument(name = "list_scheme_teams_query_handler", skip(self, query))]
    async fn handle(&self, query: ListSchemeTeamsQuery) -> Result<Self::Result, Self::Error> {
        self.scheme_repo
            .find_by_id(&query.scheme_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?
            .ok_or(SchemeError::SchemeNotFound)?;
        self.scheme_repo
            .list_teams(&query.scheme_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)
    }
}

/// Get permission tree query handler. Returns the taxonomy visible under a
/// scope: out-of-scope rows are dropped and groups left with no visible
/// permission are pruned entirely.
pub struct GetPermissionTreeQueryHandler {
    catalog: Arc<PermissionCatalog>,
    license_service: Arc<LicenseService>,
}

impl GetPermissionTreeQueryHandler {
    pub fn new(catalog: Arc<PermissionCatalog>, license_service: Arc<LicenseService>) -> Self {
        Self {
            catalog,
            license_service,
        }
    }

    fn visible_group(
        &self,
        evaluator: &TreeEvaluator<'_>,
        group: &PermissionGroupNode,
    ) -> Option<TreeGroupReadModel> {
        if !evaluator.has_permissions_on_scope(&group.children) {
            return None;
        }
        let children = group
            .children
            .iter()
            .filter_map(|child| match child {
                PermissionNode::Permission { code } => {
                    if !evaluator.is_in_scope(code) {
                        return None;
                    }
                    let def = self.catalog.get(code)?;
                    Some(TreeNodeReadModel::Permission(PermissionRowReadModel {
                        code: def.code.clone(),
                        display_name: def.display_name.clone(),
                        scope: def.scope,
                    }))
                }
                PermissionNode::Group(nested) => self
                    .visible_group(evaluator, nested)
                    .map(TreeNodeReadModel::Group),
            })
            .collect();
        Some(TreeGroupReadModel {
            id: group.id.clone(),
            combined: group.combined,
            children,
        })
    }
}

#[async_trait]
impl QueryHandler<GetPermissionTreeQuery> for GetPermissionTreeQueryHandler {
    type Result = PermissionTreeReadModel;
    type Error = SchemeError;

    #[instrument(name = "get_permission_tree_query_handler", skip(self, query))]
    async fn handle(&self, query: GetPermissionTreeQuery) -> Result<Self::Result, Self::Error> {
        // Visibility does not depend on any grant set; evaluate with an
        // empty role.
        let viewer = Role::new(String::new(), String::new(), String::new());
        let evaluator = TreeEvaluator::new(&self.catalog, query.scope, &viewer);
        let tree = self.license_service.permission_tree();
        let groups = tree
            .groups
            .iter()
            .filter_map(|group| self.visible_group(&evaluator, group))
            .collect();
        Ok(PermissionTreeReadModel {
            scope: query.scope,
            groups,
        })
    }
}

/// Get group statuses query handler. Emits the tri-state status and lock
/// state of every visible group row (nested groups included) for a role.
pub struct GetGroupStatusesQueryHandler {
    role_repo: Arc<dyn RoleRepository>,
    catalog: Arc<PermissionCatalog>,
    license_service: Arc<LicenseService>,
}

impl GetGroupStatusesQueryHandler {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        catalog: Arc<PermissionCatalog>,
        license_service: Arc<LicenseService>,
    ) -> Self {
        Self {
            role_repo,
            catalog,
            license_service,
        }
    }

    fn collect_statuses(
        evaluator: &TreeEvaluator<'_>,
        group: &PermissionGroupNode,
        out: &mut Vec<GroupStatusReadModel>,
    ) {
        if !evaluator.has_permissions_on_scope(&group.children) {
            return;
        }
        out.push(GroupStatusReadModel {
            group_id: group.id.clone(),
            status: evaluator.status(&group.children),
            locked: evaluator.all_permissions_from_parent(&group.children),
        });
        for child in &group.children {
            if let PermissionNode::Group(nested) = child {
                Self::collect_statuses(evaluator, nested, out);
            }
        }
    }
}

#[async_trait]
impl QueryHandler<GetGroupStatusesQuery> for GetGroupStatusesQueryHandler {
    type Result = GroupStatusesReadModel;
    type Error = SchemeError;

    #[instrument(name = "get_group_statuses_query_handler", skip(self, query))]
    async fn handle(&self, query: GetGroupStatusesQuery) -> Result<Self::Result, Self::Error> {
        let role = self
            .role_repo
            .find_by_id(&query.role_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?
            .ok_or(SchemeError::RoleNotFound)?;

        let parent_role = match &query.parent_role_id {
            Some(parent_role_id) => Some(
                self.role_repo
                    .find_by_id(parent_role_id)
                    .await
                    .map_err(|_| SchemeError::DatabaseError)?
                    .ok_or(SchemeError::RoleNotFound)?,
            ),
            None => None,
        };

        let mut evaluator = TreeEvaluator::new(&self.catalog, query.scope, &role);
        if let Some(parent) = &parent_role {
            evaluator = evaluator.with_parent_role(parent);
        }

        let tree = self.license_service.permission_tree();
        let mut groups = Vec::new();
        for group in &tree.groups {
            Self::collect_statuses(&evaluator, group, &mut groups);
        }

        Ok(GroupStatusesReadModel {
            role_id: query.role_id,
            scope: query.scope,
            groups,
        })
    }
}
