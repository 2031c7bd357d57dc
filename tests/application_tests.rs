use permission_scheme_service::application::command_handlers::GroupToggleOutcome;
use permission_scheme_service::application::commands::CommandFactory;
use permission_scheme_service::application::queries::{
    GroupStatusesReadModel, PaginatedResult, PermissionTreeReadModel, QueryFactory, RoleReadModel,
    SchemeReadModel,
};
use permission_scheme_service::domain::evaluator::GroupStatus;
use permission_scheme_service::domain::permission::{LicenseTier, Scope};
use permission_scheme_service::domain::role::Role;
use permission_scheme_service::domain::scheme::PermissionScheme;
use permission_scheme_service::test_utils::{
    create_test_app_state, create_test_app_state_with_tier, seed_role,
};

// ===== SCHEME LIFECYCLE =====

#[tokio::test]
async fn test_create_scheme_provisions_four_roles() {
    let state = create_test_app_state().await;

    let cmd = CommandFactory::create_scheme(
        "Engineering".to_string(),
        Some("Permission exceptions for engineering".to_string()),
    );
    let result = state.command_bus.execute(cmd).await.unwrap();
    let scheme = result.downcast::<PermissionScheme>().unwrap();

    for role_id in [
        &scheme.default_team_admin_role,
        &scheme.default_team_user_role,
        &scheme.default_channel_admin_role,
        &scheme.default_channel_user_role,
    ] {
        let role = state.role_repo.find_by_id(role_id).await.unwrap();
        assert!(role.is_some(), "missing role {role_id}");
    }

    let events = state.event_store.events_for(&scheme.id).await;
    assert_eq!(events, vec!["scheme_created"]);
}

#[tokio::test]
async fn test_create_scheme_rejects_blank_name() {
    let state = create_test_app_state().await;
    let cmd = CommandFactory::create_scheme("   ".to_string(), None);
    assert!(state.command_bus.execute(cmd).await.is_err());
}

#[tokio::test]
async fn test_patch_and_get_scheme() {
    let state = create_test_app_state().await;

    let cmd = CommandFactory::create_scheme("Engineering".to_string(), None);
    let scheme = state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<PermissionScheme>()
        .unwrap();

    let cmd = CommandFactory::patch_scheme(
        scheme.id.clone(),
        Some("Engineering v2".to_string()),
        Some("Updated".to_string()),
    );
    state.command_bus.execute(cmd).await.unwrap();

    let query = QueryFactory::get_scheme(scheme.id.clone(), true);
    let result = state.query_bus.execute(query).await.unwrap();
    let read = result.downcast::<Option<SchemeReadModel>>().unwrap().unwrap();
    assert_eq!(read.display_name, "Engineering v2");
    assert_eq!(read.description, Some("Updated".to_string()));
    assert_eq!(read.roles.len(), 4);
}

#[tokio::test]
async fn test_patch_missing_scheme_fails() {
    let state = create_test_app_state().await;
    let cmd = CommandFactory::patch_scheme("ghost".to_string(), Some("x".to_string()), None);
    assert!(state.command_bus.execute(cmd).await.is_err());
}

#[tokio::test]
async fn test_delete_scheme_removes_roles_and_teams() {
    let state = create_test_app_state().await;

    let cmd = CommandFactory::create_scheme("Doomed".to_string(), None);
    let scheme = state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<PermissionScheme>()
        .unwrap();

    let cmd = CommandFactory::attach_team_to_scheme(scheme.id.clone(), "team1".to_string());
    state.command_bus.execute(cmd).await.unwrap();

    let cmd = CommandFactory::delete_scheme(scheme.id.clone());
    state.command_bus.execute(cmd).await.unwrap();

    assert!(
        state
            .scheme_repo
            .find_by_id(&scheme.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        state
            .role_repo
            .find_by_id(&scheme.default_team_user_role)
            .await
            .unwrap()
            .is_none()
    );
    assert!(state.scheme_repo.list_teams(&scheme.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_attach_and_detach_teams() {
    let state = create_test_app_state().await;

    let cmd = CommandFactory::create_scheme("Engineering".to_string(), None);
    let scheme = state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<PermissionScheme>()
        .unwrap();

    for team in ["team1", "team2"] {
        let cmd = CommandFactory::attach_team_to_scheme(scheme.id.clone(), team.to_string());
        state.command_bus.execute(cmd).await.unwrap();
    }
    // Attaching twice is idempotent.
    let cmd = CommandFactory::attach_team_to_scheme(scheme.id.clone(), "team1".to_string());
    state.command_bus.execute(cmd).await.unwrap();

    let query = QueryFactory::list_scheme_teams(scheme.id.clone());
    let teams = state
        .query_bus
        .execute(query)
        .await
        .unwrap()
        .downcast::<Vec<String>>()
        .unwrap();
    assert_eq!(*teams, vec!["team1".to_string(), "team2".to_string()]);

    let cmd = CommandFactory::detach_team_from_scheme(scheme.id.clone(), "team1".to_string());
    state.command_bus.execute(cmd).await.unwrap();

    let query = QueryFactory::list_scheme_teams(scheme.id.clone());
    let teams = state
        .query_bus
        .execute(query)
        .await
        .unwrap()
        .downcast::<Vec<String>>()
        .unwrap();
    assert_eq!(*teams, vec!["team2".to_string()]);
}

// ===== ROLE EDITING =====

#[tokio::test]
async fn test_edit_role_drops_unknown_codes() {
    let state = create_test_app_state().await;
    let role = seed_role(&state, "all_users", &[]).await;

    let cmd = CommandFactory::edit_role_permissions(
        role.id.clone(),
        vec![
            "create_post".to_string(),
            "rule_the_world".to_string(),
            "invite_user".to_string(),
        ],
    );
    let updated = state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<Role>()
        .unwrap();
    assert_eq!(
        updated.permissions,
        vec!["create_post".to_string(), "invite_user".to_string()]
    );

    let events = state.event_store.events_for(&role.id).await;
    assert_eq!(events, vec!["role_permissions_edited"]);
}

#[tokio::test]
async fn test_edit_missing_role_fails() {
    let state = create_test_app_state().await;
    let cmd = CommandFactory::edit_role_permissions("ghost".to_string(), vec![]);
    assert!(state.command_bus.execute(cmd).await.is_err());
}

#[tokio::test]
async fn test_save_scheme_roles_splits_all_members_by_scope() {
    let state = create_test_app_state().await;

    let cmd = CommandFactory::create_scheme("Engineering".to_string(), None);
    let scheme = state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<PermissionScheme>()
        .unwrap();

    let cmd = CommandFactory::save_scheme_roles(
        scheme.id.clone(),
        vec![
            "invite_user".to_string(),
            "create_post".to_string(),
            "edit_post".to_string(),
        ],
        vec!["manage_slash_commands".to_string()],
        vec!["delete_others_posts".to_string()],
    );
    state.command_bus.execute(cmd).await.unwrap();

    let team_user = state
        .role_repo
        .find_by_id(&scheme.default_team_user_role)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(team_user.permissions, vec!["invite_user".to_string()]);

    let channel_user = state
        .role_repo
        .find_by_id(&scheme.default_channel_user_role)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        channel_user.permissions,
        vec!["create_post".to_string(), "edit_post".to_string()]
    );

    let team_admin = state
        .role_repo
        .find_by_id(&scheme.default_team_admin_role)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        team_admin.permissions,
        vec!["manage_slash_commands".to_string()]
    );
}

// ===== TOGGLE LIFECYCLE =====

async fn toggle(
    state: &permission_scheme_service::interface::AppState,
    role_id: &str,
    memory: Vec<String>,
) -> GroupToggleOutcome {
    let cmd = CommandFactory::toggle_permission_group(
        role_id.to_string(),
        "posts".to_string(),
        Scope::ChannelScope,
        None,
        memory,
        false,
    );
    *state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<GroupToggleOutcome>()
        .unwrap()
}

#[tokio::test]
async fn test_toggle_lifecycle_fill_clear_refill() {
    let state = create_test_app_state().await;
    let role = seed_role(&state, "all_users", &["edit_post", "use_channel_mentions"]).await;

    // Intermediate group: the first toggle fills the gaps.
    let first = toggle(&state, &role.id, vec![]).await;
    assert_eq!(first.status, GroupStatus::Checked);
    assert!(!first.toggled.contains(&"edit_post".to_string()));
    assert!(first.toggled.contains(&"delete_post".to_string()));
    assert_eq!(
        first.memory,
        vec!["edit_post".to_string(), "use_channel_mentions".to_string()]
    );

    // Checked group: the second toggle turns everything off and clears the
    // memory.
    let second = toggle(&state, &role.id, first.memory).await;
    assert_eq!(second.status, GroupStatus::Unchecked);
    assert!(second.memory.is_empty());
    assert!(second.permissions.is_empty());

    // Unchecked group with no memory: full activation.
    let third = toggle(&state, &role.id, second.memory).await;
    assert_eq!(third.status, GroupStatus::Checked);
}

#[tokio::test]
async fn test_toggle_restores_remembered_selection() {
    let state = create_test_app_state().await;
    let role = seed_role(&state, "all_users", &[]).await;

    let memory = vec!["edit_post".to_string(), "add_reaction".to_string()];
    let outcome = toggle(&state, &role.id, memory.clone()).await;
    assert_eq!(outcome.status, GroupStatus::Intermediate);
    assert_eq!(outcome.permissions, memory);
    assert!(outcome.memory.is_empty());
}

#[tokio::test]
async fn test_toggle_skips_parent_inherited_codes() {
    let state = create_test_app_state().await;
    let parent = seed_role(&state, "system_all_users", &["edit_post"]).await;
    let role = seed_role(&state, "all_users", &[]).await;

    let cmd = CommandFactory::toggle_permission_group(
        role.id.clone(),
        "edit_posts".to_string(),
        Scope::ChannelScope,
        Some(parent.id.clone()),
        vec![],
        false,
    );
    let outcome = *state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<GroupToggleOutcome>()
        .unwrap();
    assert_eq!(outcome.toggled, vec!["edit_others_posts".to_string()]);
    assert_eq!(outcome.status, GroupStatus::Checked);
}

#[tokio::test]
async fn test_toggle_noops_on_fully_inherited_group() {
    let state = create_test_app_state().await;
    let parent = seed_role(
        &state,
        "system_all_users",
        &["edit_post", "edit_others_posts"],
    )
    .await;
    let role = seed_role(&state, "all_users", &[]).await;

    let memory = vec!["edit_post".to_string()];
    let cmd = CommandFactory::toggle_permission_group(
        role.id.clone(),
        "edit_posts".to_string(),
        Scope::ChannelScope,
        Some(parent.id.clone()),
        memory.clone(),
        false,
    );
    let outcome = *state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<GroupToggleOutcome>()
        .unwrap();
    assert!(outcome.toggled.is_empty());
    assert_eq!(outcome.memory, memory);
    assert_eq!(outcome.status, GroupStatus::Checked);
}

#[tokio::test]
async fn test_toggle_noops_when_read_only() {
    let state = create_test_app_state().await;
    let role = seed_role(&state, "all_users", &["edit_post"]).await;

    let cmd = CommandFactory::toggle_permission_group(
        role.id.clone(),
        "posts".to_string(),
        Scope::ChannelScope,
        None,
        vec![],
        true,
    );
    let outcome = *state
        .command_bus
        .execute(cmd)
        .await
        .unwrap()
        .downcast::<GroupToggleOutcome>()
        .unwrap();
    assert!(outcome.toggled.is_empty());
    assert_eq!(outcome.permissions, vec!["edit_post".to_string()]);
}

#[tokio::test]
async fn test_toggle_unknown_group_fails() {
    let state = create_test_app_state().await;
    let role = seed_role(&state, "all_users", &[]).await;

    let cmd = CommandFactory::toggle_permission_group(
        role.id.clone(),
        "no_such_group".to_string(),
        Scope::ChannelScope,
        None,
        vec![],
        false,
    );
    assert!(state.command_bus.execute(cmd).await.is_err());
}

#[tokio::test]
async fn test_toggle_playbooks_requires_enterprise_tree() {
    let state = create_test_app_state_with_tier(LicenseTier::Professional).await;
    let role = seed_role(&state, "all_users", &[]).await;

    let cmd = CommandFactory::toggle_permission_group(
        role.id.clone(),
        "playbooks".to_string(),
        Scope::TeamScope,
        None,
        vec![],
        false,
    );
    assert!(state.command_bus.execute(cmd).await.is_err());
}

// ===== QUERIES =====

#[tokio::test]
async fn test_group_statuses_query_reports_tristate_and_locks() {
    let state = create_test_app_state().await;
    let parent = seed_role(&state, "system_all_users", &["add_reaction", "remove_reaction"]).await;
    let role = seed_role(&state, "all_users", &["edit_post"]).await;

    let query = QueryFactory::get_group_statuses(
        role.id.clone(),
        Scope::ChannelScope,
        Some(parent.id.clone()),
    );
    let statuses = *state
        .query_bus
        .execute(query)
        .await
        .unwrap()
        .downcast::<GroupStatusesReadModel>()
        .unwrap();

    let find = |id: &str| {
        statuses
            .groups
            .iter()
            .find(|g| g.group_id == id)
            .unwrap_or_else(|| panic!("missing group {id}"))
    };

    assert_eq!(find("posts").status, GroupStatus::Intermediate);
    assert_eq!(find("edit_posts").status, GroupStatus::Intermediate);
    let reactions = find("reactions");
    assert_eq!(reactions.status, GroupStatus::Checked);
    assert!(reactions.locked);
    assert_eq!(find("public_channel").status, GroupStatus::Unchecked);

    // Out-of-scope groups do not appear under the channel view.
    assert!(!statuses.groups.iter().any(|g| g.group_id == "custom_groups"));
}

#[tokio::test]
async fn test_permission_tree_query_prunes_by_scope() {
    let state = create_test_app_state().await;

    let query = QueryFactory::get_permission_tree(Scope::ChannelScope);
    let tree = *state
        .query_bus
        .execute(query)
        .await
        .unwrap()
        .downcast::<PermissionTreeReadModel>()
        .unwrap();
    let ids: Vec<&str> = tree.groups.iter().map(|g| g.id.as_str()).collect();
    assert!(ids.contains(&"posts"));
    assert!(!ids.contains(&"teams"));
    assert!(!ids.contains(&"custom_groups"));

    let query = QueryFactory::get_permission_tree(Scope::SystemScope);
    let tree = *state
        .query_bus
        .execute(query)
        .await
        .unwrap()
        .downcast::<PermissionTreeReadModel>()
        .unwrap();
    let ids: Vec<&str> = tree.groups.iter().map(|g| g.id.as_str()).collect();
    assert!(ids.contains(&"teams"));
    assert!(ids.contains(&"custom_groups"));
    assert!(ids.contains(&"playbooks"));
}

#[tokio::test]
async fn test_permission_tree_query_respects_license_tier() {
    let state = create_test_app_state_with_tier(LicenseTier::Starter).await;
    let query = QueryFactory::get_permission_tree(Scope::SystemScope);
    let tree = *state
        .query_bus
        .execute(query)
        .await
        .unwrap()
        .downcast::<PermissionTreeReadModel>()
        .unwrap();
    assert!(!tree.groups.iter().any(|g| g.id == "playbooks"));
}

#[tokio::test]
async fn test_list_roles_query_paginates_and_filters() {
    let state = create_test_app_state().await;
    seed_role(&state, "team_admin", &[]).await;
    seed_role(&state, "team_user", &[]).await;
    seed_role(&state, "channel_user", &[]).await;

    let query = QueryFactory::list_roles(1, 2, None);
    let result = *state
        .query_bus
        .execute(query)
        .await
        .unwrap()
        .downcast::<PaginatedResult<RoleReadModel>>()
        .unwrap();
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.total, 3);

    let query = QueryFactory::list_roles(1, 50, Some("team".to_string()));
    let result = *state
        .query_bus
        .execute(query)
        .await
        .unwrap()
        .downcast::<PaginatedResult<RoleReadModel>>()
        .unwrap();
    assert_eq!(result.items.len(), 2);
}
