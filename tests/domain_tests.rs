use permission_scheme_service::domain::{
    evaluator::{GroupStatus, ToggleMemory, TreeEvaluator},
    permission::{LicenseTier, PermissionCatalog, Scope},
    permission_tree::{PermissionGroupNode, PermissionNode, PermissionTree},
    role::Role,
    scheme::{PermissionScheme, combine_all_members, split_all_members},
};

fn role(name: &str, permissions: &[&str]) -> Role {
    Role::new(format!("{name}_id"), name.to_string(), name.to_string())
        .with_permissions(permissions.iter().map(|p| p.to_string()).collect())
}

fn posts_group() -> Vec<PermissionNode> {
    vec![
        PermissionNode::permission("create_post"),
        PermissionNode::permission("edit_post"),
    ]
}

// ===== SCOPE TESTS =====

#[test]
fn test_channel_visible_codes_stay_visible_in_wider_views() {
    // The scopes nest: anything visible under the channel view is visible
    // under the team and system views as well.
    let catalog = PermissionCatalog::standard();
    let empty = role("empty", &[]);
    let channel = TreeEvaluator::new(&catalog, Scope::ChannelScope, &empty);
    let team = TreeEvaluator::new(&catalog, Scope::TeamScope, &empty);
    let system = TreeEvaluator::new(&catalog, Scope::SystemScope, &empty);

    for code in [
        "create_post",
        "edit_post",
        "manage_public_channel_members",
        "use_channel_mentions",
    ] {
        assert!(channel.is_in_scope(code), "{code} under channel");
        assert!(team.is_in_scope(code), "{code} under team");
        assert!(system.is_in_scope(code), "{code} under system");
    }

    // Team-scoped codes disappear from the channel view but not the wider
    // ones.
    assert!(!channel.is_in_scope("invite_user"));
    assert!(team.is_in_scope("invite_user"));
    assert!(system.is_in_scope("invite_user"));

    // System-scoped codes only survive the system view.
    assert!(!channel.is_in_scope("create_team"));
    assert!(!team.is_in_scope("create_team"));
    assert!(system.is_in_scope("create_team"));
}

// ===== STATUS TESTS =====

#[test]
fn test_status_of_empty_and_out_of_scope_groups_is_unchecked() {
    let catalog = PermissionCatalog::standard();
    let all = role("all", &["create_team", "manage_oauth"]);
    let eval = TreeEvaluator::new(&catalog, Scope::ChannelScope, &all);

    assert_eq!(eval.status(&[]), GroupStatus::Unchecked);

    // Granted but invisible under this scope: still unchecked.
    let nodes = vec![
        PermissionNode::permission("create_team"),
        PermissionNode::permission("manage_oauth"),
    ];
    assert_eq!(eval.status(&nodes), GroupStatus::Unchecked);
}

#[test]
fn test_partially_granted_group_is_intermediate() {
    let catalog = PermissionCatalog::standard();
    let current = role("all_users", &["create_post"]);
    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&posts_group()), GroupStatus::Intermediate);
}

#[test]
fn test_nested_group_status_rolls_up() {
    let catalog = PermissionCatalog::standard();
    let tree = PermissionTree::standard(LicenseTier::Starter);
    let posts = tree.find_group("posts").unwrap();

    // Everything under posts granted: checked.
    let full = role(
        "full",
        &[
            "edit_post",
            "edit_others_posts",
            "delete_post",
            "delete_others_posts",
            "add_reaction",
            "remove_reaction",
            "use_channel_mentions",
            "use_group_mentions",
        ],
    );
    let eval = TreeEvaluator::new(&catalog, Scope::ChannelScope, &full);
    assert_eq!(eval.status(&posts.children), GroupStatus::Checked);

    // One nested combined group half granted: intermediate all the way up.
    let partial = role("partial", &["edit_post"]);
    let eval = TreeEvaluator::new(&catalog, Scope::ChannelScope, &partial);
    assert_eq!(eval.status(&posts.children), GroupStatus::Intermediate);
}

// ===== PRUNING TESTS =====

#[test]
fn test_system_only_group_is_pruned_from_channel_view() {
    let catalog = PermissionCatalog::standard();
    let empty = role("empty", &[]);
    let tree = PermissionTree::standard(LicenseTier::Starter);
    let custom_groups = tree.find_group("custom_groups").unwrap();

    let channel_eval = TreeEvaluator::new(&catalog, Scope::ChannelScope, &empty);
    assert!(!channel_eval.has_permissions_on_scope(&custom_groups.children));

    let team_eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &empty);
    assert!(!team_eval.has_permissions_on_scope(&custom_groups.children));

    let system_eval = TreeEvaluator::new(&catalog, Scope::SystemScope, &empty);
    assert!(system_eval.has_permissions_on_scope(&custom_groups.children));
}

// ===== TOGGLE TESTS =====

#[test]
fn test_toggle_inherited_codes_never_appear_in_toggle_list() {
    let catalog = PermissionCatalog::standard();
    let parent = role("parent", &["create_post"]);
    let nodes = posts_group();

    for own_permissions in [&[][..], &["edit_post"][..], &["create_post", "edit_post"][..]] {
        let own = role("own", own_permissions);
        let eval =
            TreeEvaluator::new(&catalog, Scope::TeamScope, &own).with_parent_role(&parent);
        let toggle = eval.toggle_group(&nodes, &ToggleMemory::default());
        assert!(
            !toggle.to_toggle.contains(&"create_post".to_string()),
            "inherited code toggled for own grants {own_permissions:?}"
        );
    }
}

#[test]
fn test_checked_group_round_trips_to_unchecked() {
    let catalog = PermissionCatalog::standard();
    let mut current = role("all_users", &["create_post", "edit_post"]);
    let nodes = posts_group();

    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Checked);
    let toggle = eval.toggle_group(&nodes, &ToggleMemory::default());
    assert_eq!(
        toggle.to_toggle,
        vec!["create_post".to_string(), "edit_post".to_string()]
    );

    current.apply_toggles(&toggle.to_toggle);
    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Unchecked);
}

#[test]
fn test_intermediate_group_fills_then_clears_across_two_toggles() {
    let catalog = PermissionCatalog::standard();
    let mut current = role("all_users", &["create_post"]);
    let nodes = posts_group();

    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Intermediate);

    // First toggle completes the selection.
    let first = eval.toggle_group(&nodes, &ToggleMemory::default());
    current.apply_toggles(&first.to_toggle);
    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Checked);

    // Second toggle wipes it.
    let second = eval.toggle_group(&nodes, &first.memory);
    current.apply_toggles(&second.to_toggle);
    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Unchecked);
}

#[test]
fn test_partial_selection_example() {
    let catalog = PermissionCatalog::standard();
    let current = role("all_users", &["create_post"]);
    let nodes = vec![PermissionNode::group(PermissionGroupNode::new(
        "posts",
        posts_group(),
    ))];

    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Intermediate);
    let toggle = eval.toggle_group(&nodes, &ToggleMemory::default());
    assert_eq!(toggle.to_toggle, vec!["edit_post".to_string()]);
}

#[test]
fn test_full_selection_example() {
    let catalog = PermissionCatalog::standard();
    let current = role("all_users", &["create_post", "edit_post"]);
    let nodes = vec![PermissionNode::group(PermissionGroupNode::new(
        "posts",
        posts_group(),
    ))];

    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Checked);
    let toggle = eval.toggle_group(&nodes, &ToggleMemory::default());
    assert_eq!(
        toggle.to_toggle,
        vec!["create_post".to_string(), "edit_post".to_string()]
    );
}

#[test]
fn test_restore_previous_selection_after_clear() {
    // A user with a partial selection clears it, then toggles the group
    // back on: the partial selection comes back instead of everything.
    let catalog = PermissionCatalog::standard();
    let mut current = role("all_users", &["create_post"]);
    let nodes = posts_group();

    // Simulate the clear branch by toggling an intermediate group that
    // already has memory.
    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    let clear = eval.toggle_group(&nodes, &ToggleMemory::remember(&["edit_post".to_string()]));
    assert_eq!(clear.to_toggle, vec!["create_post".to_string()]);
    current.apply_toggles(&clear.to_toggle);

    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Unchecked);

    // Toggling back on restores exactly the remembered selection.
    let restore = eval.toggle_group(&nodes, &clear.memory);
    assert_eq!(restore.to_toggle, vec!["create_post".to_string()]);
    current.apply_toggles(&restore.to_toggle);
    let eval = TreeEvaluator::new(&catalog, Scope::TeamScope, &current);
    assert_eq!(eval.status(&nodes), GroupStatus::Intermediate);
}

// ===== ROLE DOMAIN TESTS =====

#[test]
fn test_role_creation() {
    let role = Role::new(
        "role1".to_string(),
        "team_user".to_string(),
        "Team User".to_string(),
    )
    .with_permissions(vec!["invite_user".to_string()]);

    assert_eq!(role.id, "role1");
    assert_eq!(role.name, "team_user");
    assert_eq!(role.display_name, "Team User");
    assert_eq!(role.permissions, vec!["invite_user".to_string()]);
}

#[test]
fn test_role_toggle_application_is_involutive() {
    let mut role = role("all_users", &["create_post", "edit_post"]);
    let toggles = vec!["create_post".to_string(), "add_reaction".to_string()];

    role.apply_toggles(&toggles);
    assert!(!role.has_permission("create_post"));
    assert!(role.has_permission("add_reaction"));

    role.apply_toggles(&toggles);
    assert!(role.has_permission("create_post"));
    assert!(!role.has_permission("add_reaction"));
}

// ===== SCHEME DOMAIN TESTS =====

#[test]
fn test_scheme_creation() {
    let scheme = PermissionScheme::new(
        "scheme1".to_string(),
        "Engineering".to_string(),
        "ta".to_string(),
        "tu".to_string(),
        "ca".to_string(),
        "cu".to_string(),
    );

    assert_eq!(scheme.display_name, "Engineering");
    assert!(scheme.description.is_none());
}

#[test]
fn test_all_members_split_respects_declared_scope() {
    let catalog = PermissionCatalog::standard();
    let team_user = role("team_user", &["invite_user", "create_private_channel"]);
    let channel_user = role("channel_user", &["create_post", "delete_post"]);

    let all_members = combine_all_members(&team_user, &channel_user);
    assert_eq!(all_members.len(), 4);

    let split = split_all_members(&catalog, &all_members);
    assert_eq!(
        split.team_user,
        vec!["invite_user".to_string(), "create_private_channel".to_string()]
    );
    assert_eq!(
        split.channel_user,
        vec!["create_post".to_string(), "delete_post".to_string()]
    );
}

// ===== TREE TESTS =====

#[test]
fn test_tree_is_license_gated() {
    for tier in [LicenseTier::Starter, LicenseTier::Professional] {
        assert!(PermissionTree::standard(tier).find_group("playbooks").is_none());
    }
    assert!(
        PermissionTree::standard(LicenseTier::Enterprise)
            .find_group("playbooks")
            .is_some()
    );
}

#[test]
fn test_combined_groups_participate_in_aggregation() {
    let catalog = PermissionCatalog::standard();
    let tree = PermissionTree::standard(LicenseTier::Starter);
    let posts = tree.find_group("posts").unwrap();

    // Granting exactly one combined subgroup's leaves keeps the parent
    // intermediate but the subgroup itself checked.
    let current = role("all_users", &["edit_post", "edit_others_posts"]);
    let eval = TreeEvaluator::new(&catalog, Scope::ChannelScope, &current);
    assert_eq!(eval.status(&posts.children), GroupStatus::Intermediate);

    let edit_posts = tree.find_group("edit_posts").unwrap();
    assert!(edit_posts.combined);
    assert_eq!(eval.status(&edit_posts.children), GroupStatus::Checked);
}
