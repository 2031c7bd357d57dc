use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Visibility tier of a permission. Admin screens evaluate the permission
/// tree under one of these scopes and only see compatible permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    SystemScope,
    TeamScope,
    ChannelScope,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::SystemScope => "system_scope",
            Scope::TeamScope => "team_scope",
            Scope::ChannelScope => "channel_scope",
        }
    }

    /// Whether a permission declared at `declared` is visible when the tree
    /// is evaluated under `self`. The tiers nest: channel ⊂ team ⊂ system,
    /// and the team view admits channel permissions.
    pub fn admits(&self, declared: Scope) -> bool {
        match self {
            Scope::ChannelScope => declared == Scope::ChannelScope,
            Scope::TeamScope => declared != Scope::SystemScope,
            Scope::SystemScope => true,
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system_scope" => Ok(Scope::SystemScope),
            "team_scope" => Ok(Scope::TeamScope),
            "channel_scope" => Ok(Scope::ChannelScope),
            other => Err(format!("unknown scope: {other}")),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// License tiers gating parts of the permission taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseTier {
    Starter,
    Professional,
    Enterprise,
}

impl std::str::FromStr for LicenseTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(LicenseTier::Starter),
            "professional" => Ok(LicenseTier::Professional),
            "enterprise" => Ok(LicenseTier::Enterprise),
            other => Err(format!("unknown license tier: {other}")),
        }
    }
}

/// Definition of a single grantable permission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionDef {
    pub code: String,
    pub scope: Scope,
    pub display_name: String,
}

impl PermissionDef {
    pub fn new(code: &str, scope: Scope, display_name: &str) -> Self {
        Self {
            code: code.to_string(),
            scope,
            display_name: display_name.to_string(),
        }
    }
}

static STANDARD_DEFS: Lazy<Vec<PermissionDef>> = Lazy::new(|| {
    use Scope::{ChannelScope as Channel, SystemScope as System, TeamScope as Team};
    vec![
        // Teams
        PermissionDef::new("invite_user", Team, "Invite users via email"),
        PermissionDef::new("add_user_to_team", Team, "Add members to the team"),
        PermissionDef::new("create_team", System, "Create teams"),
        PermissionDef::new("view_team", Team, "View the team"),
        PermissionDef::new("remove_user_from_team", Team, "Remove members from the team"),
        // Public channels
        PermissionDef::new("create_public_channel", Team, "Create public channels"),
        PermissionDef::new(
            "manage_public_channel_properties",
            Channel,
            "Manage public channel names, headers and purposes",
        ),
        PermissionDef::new(
            "manage_public_channel_members",
            Channel,
            "Manage public channel members",
        ),
        PermissionDef::new("delete_public_channel", Channel, "Archive public channels"),
        PermissionDef::new(
            "convert_public_channel_to_private",
            Channel,
            "Convert public channels to private",
        ),
        // Private channels
        PermissionDef::new("create_private_channel", Team, "Create private channels"),
        PermissionDef::new(
            "manage_private_channel_properties",
            Channel,
            "Manage private channel names, headers and purposes",
        ),
        PermissionDef::new(
            "manage_private_channel_members",
            Channel,
            "Manage private channel members",
        ),
        PermissionDef::new("delete_private_channel", Channel, "Archive private channels"),
        PermissionDef::new(
            "convert_private_channel_to_public",
            Channel,
            "Convert private channels to public",
        ),
        // Posts
        PermissionDef::new("create_post", Channel, "Write messages"),
        PermissionDef::new("edit_post", Channel, "Edit own messages"),
        PermissionDef::new("edit_others_posts", Channel, "Edit others' messages"),
        PermissionDef::new("delete_post", Channel, "Delete own messages"),
        PermissionDef::new("delete_others_posts", Channel, "Delete others' messages"),
        PermissionDef::new("add_reaction", Channel, "Add reactions"),
        PermissionDef::new("remove_reaction", Channel, "Remove own reactions"),
        PermissionDef::new("use_channel_mentions", Channel, "Use @channel and @all mentions"),
        PermissionDef::new("use_group_mentions", Channel, "Use custom group mentions"),
        PermissionDef::new("upload_file", Channel, "Attach files to messages"),
        // Integrations
        PermissionDef::new("manage_incoming_webhooks", Team, "Manage incoming webhooks"),
        PermissionDef::new("manage_outgoing_webhooks", Team, "Manage outgoing webhooks"),
        PermissionDef::new("manage_slash_commands", Team, "Manage slash commands"),
        PermissionDef::new("manage_oauth", System, "Manage OAuth 2.0 applications"),
        PermissionDef::new("create_emojis", Team, "Create custom emoji"),
        PermissionDef::new("delete_emojis", Team, "Delete own custom emoji"),
        PermissionDef::new("delete_others_emojis", Team, "Delete others' custom emoji"),
        // Custom groups
        PermissionDef::new("create_custom_group", System, "Create custom groups"),
        PermissionDef::new("edit_custom_group", System, "Edit custom groups"),
        PermissionDef::new("delete_custom_group", System, "Delete custom groups"),
        PermissionDef::new(
            "manage_custom_group_members",
            System,
            "Manage custom group members",
        ),
        // Playbooks (enterprise tier)
        PermissionDef::new("playbook_public_create", Team, "Create public playbooks"),
        PermissionDef::new(
            "playbook_public_manage_properties",
            Team,
            "Manage public playbook properties",
        ),
        PermissionDef::new("playbook_private_create", Team, "Create private playbooks"),
        PermissionDef::new(
            "playbook_private_manage_properties",
            Team,
            "Manage private playbook properties",
        ),
        PermissionDef::new("run_create", Team, "Start playbook runs"),
    ]
});

/// Typed lookup from permission code to its definition. The evaluator takes
/// the catalog as an explicit input; nothing reads it through a global.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    defs: HashMap<String, PermissionDef>,
}

impl PermissionCatalog {
    /// Catalog of every permission the platform defines.
    pub fn standard() -> Self {
        Self::from_defs(STANDARD_DEFS.clone())
    }

    pub fn from_defs(defs: Vec<PermissionDef>) -> Self {
        Self {
            defs: defs.into_iter().map(|d| (d.code.clone(), d)).collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&PermissionDef> {
        self.defs.get(code)
    }

    /// Declared scope of a code; `None` for codes the platform does not know.
    pub fn scope_of(&self, code: &str) -> Option<Scope> {
        self.defs.get(code).map(|d| d.scope)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.defs.contains_key(code)
    }

    pub fn display_name_of(&self, code: &str) -> Option<&str> {
        self.defs.get(code).map(|d| d.display_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
