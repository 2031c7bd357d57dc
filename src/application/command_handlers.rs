use super::command_bus::CommandHandler;
use super::commands::{
    AttachTeamToSchemeCommand, CreateSchemeCommand, DeleteSchemeCommand,
    DetachTeamFromSchemeCommand, EditRolePermissionsCommand, PatchSchemeCommand,
    SaveSchemeRolesCommand, TogglePermissionGroupCommand,
};
use super::events::{EventFactory, EventStore};
use super::services::{LicenseService, SchemeError, SchemeService};
use super::validators::{RoleCommandValidator, SchemeCommandValidator};
use crate::domain::evaluator::{GroupStatus, ToggleMemory, TreeEvaluator};
use crate::domain::permission::PermissionCatalog;
use crate::domain::role::Role;
use crate::domain::scheme::PermissionScheme;
use crate::infrastructure::{RoleRepository, SchemeRepository};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

/// Create scheme command handler. Provisions the four default roles the
/// scheme screen edits, then the scheme row itself.
pub struct CreateSchemeCommandHandler {
    role_repo: Arc<dyn RoleRepository>,
    scheme_repo: Arc<dyn SchemeRepository>,
    event_store: Arc<dyn EventStore>,
}

impl CreateSchemeCommandHandler {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        scheme_repo: Arc<dyn SchemeRepository>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            role_repo,
            scheme_repo,
            event_store,
        }
    }
}

#[async_trait]
impl CommandHandler<CreateSchemeCommand> for CreateSchemeCommandHandler {
    type Result = PermissionScheme;
    type Error = SchemeError;

    #[instrument(name = "create_scheme_command_handler", skip(self, command))]
    async fn handle(&self, command: CreateSchemeCommand) -> Result<Self::Result, Self::Error> {
        SchemeCommandValidator::validate_create(&command)
            .map_err(|e| SchemeError::Validation(e.to_string()))?;

        let team_admin = self
            .role_repo
            .create_role("team_admin", "Team Administrator")
            .await
            .map_err(|_| SchemeError::DatabaseError)?;
        let team_user = self
            .role_repo
            .create_role("team_user", "Team User")
            .await
            .map_err(|_| SchemeError::DatabaseError)?;
        let channel_admin = self
            .role_repo
            .create_role("channel_admin", "Channel Administrator")
            .await
            .map_err(|_| SchemeError::DatabaseError)?;
        let channel_user = self
            .role_repo
            .create_role("channel_user", "Channel User")
            .await
            .map_err(|_| SchemeError::DatabaseError)?;

        let mut scheme = PermissionScheme::new(
            uuid::Uuid::new_v4().to_string(),
            command.display_name,
            team_admin.id,
            team_user.id,
            channel_admin.id,
            channel_user.id,
        );
        if let Some(description) = command.description {
            scheme = scheme.with_description(description);
        }

        self.scheme_repo
            .insert_scheme(&scheme)
            .await
            .map_err(|_| SchemeError::DatabaseError)?;

        let event = EventFactory::scheme_created(scheme.id.clone(), scheme.display_name.clone());
        tracing::info!(event_id = %event.event_id, scheme_id = %scheme.id, "Scheme created event published");
        self.event_store.append(Box::new(event)).await;

        Ok(scheme)
    }
}

/// Patch scheme command handler
pub struct PatchSchemeCommandHandler {
    scheme_repo: Arc<dyn SchemeRepository>,
    event_store: Arc<dyn EventStore>,
}

impl PatchSchemeCommandHandler {
    pub fn new(
        scheme_repo: Arc<dyn SchemeRepository>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            scheme_repo,
            event_store,
        }
    }
}

#[async_trait]
impl CommandHandler<PatchSchemeCommand> for PatchSchemeCommandHandler {
    type Result = ();
    type Error = SchemeError;

    #[instrument(name = "patch_scheme_command_handler", skip(self, command))]
    async fn handle(&self, command: PatchSchemeCommand) -> Result<Self::Result, Self::Error> {
        SchemeCommandValidator::validate_patch(&command)
            .map_err(|e| SchemeError::Validation(e.to_string()))?;

        self.scheme_repo
            .patch_scheme(
                &command.scheme_id,
                command.display_name.as_deref(),
                command.description.as_deref(),
            )
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => SchemeError::SchemeNotFound,
                _ => SchemeError::DatabaseError,
            })?;

        let event = EventFactory::scheme_updated(command.scheme_id.clone());
        tracing::info!(event_id = %event.event_id, "Scheme updated event published");
        self.event_store.append(Box::new(event)).await;
        Ok(())
    }
}

/// Delete scheme command handler. Also deletes the scheme's four roles and
/// team attachments.
pub struct DeleteSchemeCommandHandler {
    role_repo: Arc<dyn RoleRepository>,
    scheme_repo: Arc<dyn SchemeRepository>,
    event_store: Arc<dyn EventStore>,
}

impl DeleteSchemeCommandHandler {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        scheme_repo: Arc<dyn SchemeRepository>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            role_repo,
            scheme_repo,
            event_store,
        }
    }
}

#[async_trait]
impl CommandHandler<DeleteSchemeCommand> for DeleteSchemeCommandHandler {
    type Result = ();
    type Error = SchemeError;

    #[instrument(name = "delete_scheme_command_handler", skip(self, command))]
    async fn handle(&self, command: DeleteSchemeCommand) -> Result<Self::Result, Self::Error> {
        let scheme = self
            .scheme_repo
            .find_by_id(&command.scheme_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?
            .ok_or(SchemeError::SchemeNotFound)?;

        for role_id in [
            &scheme.default_team_admin_role,
            &scheme.default_team_user_role,
            &scheme.default_channel_admin_role,
            &scheme.default_channel_user_role,
        ] {
            self.role_repo
                .delete_role(role_id)
                .await
                .map_err(|_| SchemeError::DatabaseError)?;
        }

        self.scheme_repo
            .delete_scheme(&command.scheme_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?;

        let event = EventFactory::scheme_deleted(command.scheme_id.clone());
        tracing::info!(event_id = %event.event_id, "Scheme deleted event published");
        self.event_store.append(Box::new(event)).await;
        Ok(())
    }
}

/// Attach team command handler
pub struct AttachTeamToSchemeCommandHandler {
    scheme_repo: Arc<dyn SchemeRepository>,
    event_store: Arc<dyn EventStore>,
}

impl AttachTeamToSchemeCommandHandler {
    pub fn new(
        scheme_repo: Arc<dyn SchemeRepository>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            scheme_repo,
            event_store,
        }
    }
}

#[async_trait]
impl CommandHandler<AttachTeamToSchemeCommand> for AttachTeamToSchemeCommandHandler {
    type Result = ();
    type Error = SchemeError;

    #[instrument(name = "attach_team_command_handler", skip(self, command))]
    async fn handle(&self, command: AttachTeamToSchemeCommand) -> Result<Self::Result, Self::Error> {
        self.scheme_repo
            .find_by_id(&command.scheme_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?
            .ok_or(SchemeError::SchemeNotFound)?;

        self.scheme_repo
            .attach_team(&command.scheme_id, &command.team_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?;

        let event =
            EventFactory::team_attached_to_scheme(command.scheme_id.clone(), command.team_id);
        tracing::info!(event_id = %event.event_id, "Team attached event published");
        self.event_store.append(Box::new(event)).await;
        Ok(())
    }
}

/// Detach team command handler
pub struct DetachTeamFromSchemeCommandHandler {
    scheme_repo: Arc<dyn SchemeRepository>,
    event_store: Arc<dyn EventStore>,
}

impl DetachTeamFromSchemeCommandHandler {
    pub fn new(
        scheme_repo: Arc<dyn SchemeRepository>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            scheme_repo,
            event_store,
        }
    }
}

#[async_trait]
impl CommandHandler<DetachTeamFromSchemeCommand> for DetachTeamFromSchemeCommandHandler {
    type Result = ();
    type Error = SchemeError;

    #[instrument(name = "detach_team_command_handler", skip(self, command))]
    async fn handle(
        &self,
        command: DetachTeamFromSchemeCommand,
    ) -> Result<Self::Result, Self::Error> {
        self.scheme_repo
            .detach_team(&command.scheme_id, &command.team_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?;

        let event =
            EventFactory::team_detached_from_scheme(command.scheme_id.clone(), command.team_id);
        tracing::info!(event_id = %event.event_id, "Team detached event published");
        self.event_store.append(Box::new(event)).await;
        Ok(())
    }
}

/// Edit role permissions command handler. Replaces the grant set wholesale;
/// codes the catalog does not define are dropped.
pub struct EditRolePermissionsCommandHandler {
    role_repo: Arc<dyn RoleRepository>,
    scheme_service: Arc<SchemeService>,
    event_store: Arc<dyn EventStore>,
}

impl EditRolePermissionsCommandHandler {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        scheme_service: Arc<SchemeService>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            role_repo,
            scheme_service,
            event_store,
        }
    }
}

#[async_trait]
impl CommandHandler<EditRolePermissionsCommand> for EditRolePermissionsCommandHandler {
    type Result = Role;
    type Error = SchemeError;

    #[instrument(name = "edit_role_permissions_command_handler", skip(self, command))]
    async fn handle(
        &self,
        command: EditRolePermissionsCommand,
    ) -> Result<Self::Result, Self::Error> {
        RoleCommandValidator::validate_edit(&command)
            .map_err(|e| SchemeError::Validation(e.to_string()))?;

        let role = self
            .role_repo
            .find_by_id(&command.role_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?
            .ok_or(SchemeError::RoleNotFound)?;

        let permissions = self.scheme_service.retain_known(command.permissions);
        self.role_repo
            .save_permissions(&role.id, &permissions)
            .await
            .map_err(|_| SchemeError::DatabaseError)?;

        let event = EventFactory::role_permissions_edited(role.id.clone(), permissions.clone());
        tracing::info!(event_id = %event.event_id, role_id = %role.id, "Role permissions edited event published");
        self.event_store.append(Box::new(event)).await;

        Ok(role.with_permissions(permissions))
    }
}

/// Save scheme roles command handler. Splits the edited all-members list by
/// declared scope into the team-user and channel-user roles and persists
/// all four role grant sets.
pub struct SaveSchemeRolesCommandHandler {
    role_repo: Arc<dyn RoleRepository>,
    scheme_repo: Arc<dyn SchemeRepository>,
    scheme_service: Arc<SchemeService>,
    event_store: Arc<dyn EventStore>,
}

impl SaveSchemeRolesCommandHandler {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        scheme_repo: Arc<dyn SchemeRepository>,
        scheme_service: Arc<SchemeService>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            role_repo,
            scheme_repo,
            scheme_service,
            event_store,
        }
    }
}

#[async_trait]
impl CommandHandler<SaveSchemeRolesCommand> for SaveSchemeRolesCommandHandler {
    type Result = ();
    type Error = SchemeError;

    #[instrument(name = "save_scheme_roles_command_handler", skip(self, command))]
    async fn handle(&self, command: SaveSchemeRolesCommand) -> Result<Self::Result, Self::Error> {
        let scheme = self
            .scheme_repo
            .find_by_id(&command.scheme_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?
            .ok_or(SchemeError::SchemeNotFound)?;

        let split = self
            .scheme_service
            .split_all_members(&self.scheme_service.retain_known(command.all_members));
        let team_admin = self.scheme_service.retain_known(command.team_admin);
        let channel_admin = self.scheme_service.retain_known(command.channel_admin);

        let saves = [
            (&scheme.default_team_admin_role, team_admin),
            (&scheme.default_team_user_role, split.team_user),
            (&scheme.default_channel_admin_role, channel_admin),
            (&scheme.default_channel_user_role, split.channel_user),
        ];
        let results = join_all(
            saves
                .iter()
                .map(|(role_id, permissions)| self.role_repo.save_permissions(role_id, permissions)),
        )
        .await;
        if results.iter().any(|r| r.is_err()) {
            return Err(SchemeError::DatabaseError);
        }

        let event = EventFactory::scheme_updated(scheme.id.clone());
        tracing::info!(event_id = %event.event_id, scheme_id = %scheme.id, "Scheme roles saved event published");
        self.event_store.append(Box::new(event)).await;
        Ok(())
    }
}

/// Outcome of a toggle-all gesture, echoed back to the admin console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupToggleOutcome {
    pub role_id: String,
    pub group_id: String,
    /// Codes whose membership was flipped.
    pub toggled: Vec<String>,
    /// Memory to thread into the next toggle on this group.
    pub memory: Vec<String>,
    /// Group status after the toggle was applied.
    pub status: GroupStatus,
    /// The role's grant set after the toggle was applied.
    pub permissions: Vec<String>,
}

/// Toggle permission group command handler. Loads the role (and inherited
/// scheme), evaluates the group, applies the resulting toggle list, and
/// persists the new grant set.
pub struct TogglePermissionGroupCommandHandler {
    role_repo: Arc<dyn RoleRepository>,
    catalog: Arc<PermissionCatalog>,
    license_service: Arc<LicenseService>,
    event_store: Arc<dyn EventStore>,
}

impl TogglePermissionGroupCommandHandler {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        catalog: Arc<PermissionCatalog>,
        license_service: Arc<LicenseService>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            role_repo,
            catalog,
            license_service,
            event_store,
        }
    }
}

#[async_trait]
impl CommandHandler<TogglePermissionGroupCommand> for TogglePermissionGroupCommandHandler {
    type Result = GroupToggleOutcome;
    type Error = SchemeError;

    #[instrument(name = "toggle_permission_group_command_handler", skip(self, command))]
    async fn handle(
        &self,
        command: TogglePermissionGroupCommand,
    ) -> Result<Self::Result, Self::Error> {
        RoleCommandValidator::validate_toggle(&command)
            .map_err(|e| SchemeError::Validation(e.to_string()))?;

        let mut role = self
            .role_repo
            .find_by_id(&command.role_id)
            .await
            .map_err(|_| SchemeError::DatabaseError)?
            .ok_or(SchemeError::RoleNotFound)?;

        let parent_role = match &command.parent_role_id {
            Some(parent_role_id) => Some(
                self.role_repo
                    .find_by_id(parent_role_id)
                    .await
                    .map_err(|_| SchemeError::DatabaseError)?
                    .ok_or(SchemeError::RoleNotFound)?,
            ),
            None => None,
        };

        let tree = self.license_service.permission_tree();
        let group = tree
            .find_group(&command.group_id)
            .ok_or(SchemeError::GroupNotFound)?;

        let memory = ToggleMemory {
            previous_permissions: command.memory,
        };

        let toggle = {
            let mut evaluator = TreeEvaluator::new(&self.catalog, command.scope, &role);
            if let Some(parent) = &parent_role {
                evaluator = evaluator.with_parent_role(parent);
            }
            // Locked groups (and read-only screens) toggle nothing; the
            // memory is handed back untouched.
            if command.read_only || evaluator.all_permissions_from_parent(&group.children) {
                let status = evaluator.status(&group.children);
                return Ok(GroupToggleOutcome {
                    role_id: role.id.clone(),
                    group_id: command.group_id,
                    toggled: vec![],
                    memory: memory.previous_permissions,
                    status,
                    permissions: role.permissions,
                });
            }
            evaluator.toggle_group(&group.children, &memory)
        };

        role.apply_toggles(&toggle.to_toggle);
        self.role_repo
            .save_permissions(&role.id, &role.permissions)
            .await
            .map_err(|_| SchemeError::DatabaseError)?;

        let status = {
            let mut evaluator = TreeEvaluator::new(&self.catalog, command.scope, &role);
            if let Some(parent) = &parent_role {
                evaluator = evaluator.with_parent_role(parent);
            }
            evaluator.status(&group.children)
        };

        let event = EventFactory::permission_group_toggled(
            role.id.clone(),
            command.group_id.clone(),
            toggle.to_toggle.clone(),
        );
        tracing::info!(event_id = %event.event_id, role_id = %role.id, group_id = %command.group_id, "Permission group toggled event published");
        self.event_store.append(Box::new(event)).await;

        Ok(GroupToggleOutcome {
            role_id: role.id.clone(),
            group_id: command.group_id,
            toggled: toggle.to_toggle,
            memory: toggle.memory.previous_permissions,
            status,
            permissions: role.permissions,
        })
    }
}
