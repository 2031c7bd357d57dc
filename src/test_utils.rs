//! In-memory application state for tests.

use crate::application::command_bus::CommandBus;
use crate::application::events::{EventStore, InMemoryEventStore};
use crate::application::query_bus::QueryBus;
use crate::application::services::{LicenseService, SchemeService};
use crate::domain::permission::{LicenseTier, PermissionCatalog};
use crate::domain::role::Role;
use crate::infrastructure::{
    InMemoryRoleRepository, InMemorySchemeRepository, RoleRepository, SchemeRepository,
};
use crate::interface::AppState;
use crate::AppStateBuilder;
use std::sync::Arc;

/// Builds an AppState backed by in-memory repositories, with every command
/// and query handler registered.
pub async fn create_test_app_state() -> Arc<AppState> {
    create_test_app_state_with_tier(LicenseTier::Enterprise).await
}

pub async fn create_test_app_state_with_tier(tier: LicenseTier) -> Arc<AppState> {
    let role_repo = Arc::new(InMemoryRoleRepository::new()) as Arc<dyn RoleRepository>;
    let scheme_repo = Arc::new(InMemorySchemeRepository::new()) as Arc<dyn SchemeRepository>;
    let catalog = Arc::new(PermissionCatalog::standard());
    let license_service = Arc::new(LicenseService::new(tier));
    let scheme_service = Arc::new(SchemeService::new(catalog.clone()));
    let event_store = Arc::new(InMemoryEventStore::new()) as Arc<dyn EventStore>;

    let command_bus = Arc::new(CommandBus::new());
    let query_bus = Arc::new(QueryBus::new());

    AppStateBuilder::register_command_handlers(
        &command_bus,
        &role_repo,
        &scheme_repo,
        &catalog,
        &license_service,
        &scheme_service,
        &event_store,
    )
    .await;
    AppStateBuilder::register_query_handlers(
        &query_bus,
        &role_repo,
        &scheme_repo,
        &catalog,
        &license_service,
    )
    .await;

    Arc::new(AppState {
        role_repo,
        scheme_repo,
        catalog,
        license_service,
        scheme_service,
        event_store,
        command_bus,
        query_bus,
    })
}

/// Creates a role through the repository and grants it `permissions`.
pub async fn seed_role(state: &AppState, name: &str, permissions: &[&str]) -> Role {
    let role = state
        .role_repo
        .create_role(name, name)
        .await
        .expect("create role");
    let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
    state
        .role_repo
        .save_permissions(&role.id, &permissions)
        .await
        .expect("save permissions");
    role.with_permissions(permissions)
}
