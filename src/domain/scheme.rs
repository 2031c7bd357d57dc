use crate::domain::permission::{PermissionCatalog, Scope};
use crate::domain::role::Role;
use serde::{Deserialize, Serialize};

/// Team override scheme aggregate: a named permission exception for a set
/// of teams, carrying the four roles the admin console edits.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PermissionScheme {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub default_team_admin_role: String,
    pub default_team_user_role: String,
    pub default_channel_admin_role: String,
    pub default_channel_user_role: String,
}

impl PermissionScheme {
    pub fn new(
        id: String,
        display_name: String,
        default_team_admin_role: String,
        default_team_user_role: String,
        default_channel_admin_role: String,
        default_channel_user_role: String,
    ) -> Self {
        Self {
            id,
            display_name,
            description: None,
            default_team_admin_role,
            default_team_user_role,
            default_channel_admin_role,
            default_channel_user_role,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }
}

/// The "All Members" row of the scheme screen is the team-user and
/// channel-user grant sets presented as one list.
pub fn combine_all_members(team_user: &Role, channel_user: &Role) -> Vec<String> {
    let mut permissions = team_user.permissions.clone();
    permissions.extend(channel_user.permissions.iter().cloned());
    permissions
}

/// The edited all-members list split back into per-role grant sets by each
/// code's declared scope.
#[derive(Debug, Clone, PartialEq)]
pub struct AllMembersSplit {
    pub team_user: Vec<String>,
    pub channel_user: Vec<String>,
}

pub fn split_all_members(catalog: &PermissionCatalog, permissions: &[String]) -> AllMembersSplit {
    AllMembersSplit {
        team_user: permissions
            .iter()
            .filter(|code| catalog.scope_of(code) == Some(Scope::TeamScope))
            .cloned()
            .collect(),
        channel_user: permissions
            .iter()
            .filter(|code| catalog.scope_of(code) == Some(Scope::ChannelScope))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, permissions: &[&str]) -> Role {
        Role::new(format!("{name}_id"), name.to_string(), name.to_string())
            .with_permissions(permissions.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_combine_then_split_round_trips_by_scope() {
        let catalog = PermissionCatalog::standard();
        let team_user = role("team_user", &["invite_user", "create_public_channel"]);
        let channel_user = role("channel_user", &["create_post", "edit_post"]);

        let all_members = combine_all_members(&team_user, &channel_user);
        let split = split_all_members(&catalog, &all_members);

        assert_eq!(split.team_user, team_user.permissions);
        assert_eq!(split.channel_user, channel_user.permissions);
    }

    #[test]
    fn test_split_drops_system_and_unknown_codes() {
        let catalog = PermissionCatalog::standard();
        let permissions = vec![
            "create_team".to_string(),
            "invite_user".to_string(),
            "no_such_code".to_string(),
        ];
        let split = split_all_members(&catalog, &permissions);
        assert_eq!(split.team_user, vec!["invite_user".to_string()]);
        assert!(split.channel_user.is_empty());
    }

    #[test]
    fn test_scheme_builder() {
        let scheme = PermissionScheme::new(
            "scheme1".to_string(),
            "Engineering".to_string(),
            "ta".to_string(),
            "tu".to_string(),
            "ca".to_string(),
            "cu".to_string(),
        )
        .with_description("Permission exceptions for engineering teams".to_string());

        assert_eq!(scheme.display_name, "Engineering");
        assert!(scheme.description.is_some());
        assert_eq!(scheme.default_team_user_role, "tu");
    }
}
