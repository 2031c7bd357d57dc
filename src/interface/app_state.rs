use crate::application::command_bus::CommandBus;
use crate::application::events::EventStore;
use crate::application::query_bus::QueryBus;
use crate::application::services::{LicenseService, SchemeService};
use crate::domain::permission::PermissionCatalog;
use crate::infrastructure::{RoleRepository, SchemeRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub role_repo: Arc<dyn RoleRepository>,
    pub scheme_repo: Arc<dyn SchemeRepository>,
    pub catalog: Arc<PermissionCatalog>,
    pub license_service: Arc<LicenseService>,
    pub scheme_service: Arc<SchemeService>,
    pub event_store: Arc<dyn EventStore>,
    pub command_bus: Arc<CommandBus>,
    pub query_bus: Arc<QueryBus>,
}
