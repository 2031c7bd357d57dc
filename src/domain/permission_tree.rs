use crate::domain::permission::LicenseTier;
use serde::{Deserialize, Serialize};

/// A node of the permission taxonomy: either a single grantable permission
/// or a named group of nested nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PermissionNode {
    Permission { code: String },
    Group(PermissionGroupNode),
}

impl PermissionNode {
    pub fn permission(code: &str) -> Self {
        PermissionNode::Permission {
            code: code.to_string(),
        }
    }

    pub fn group(group: PermissionGroupNode) -> Self {
        PermissionNode::Group(group)
    }
}

/// A group row of the taxonomy. `combined` groups roll their children's
/// status into the group row instead of rendering a nested sub-tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionGroupNode {
    pub id: String,
    pub children: Vec<PermissionNode>,
    pub combined: bool,
}

impl PermissionGroupNode {
    pub fn new(id: &str, children: Vec<PermissionNode>) -> Self {
        Self {
            id: id.to_string(),
            children,
            combined: false,
        }
    }

    pub fn combined(id: &str, children: Vec<PermissionNode>) -> Self {
        Self {
            id: id.to_string(),
            children,
            combined: true,
        }
    }

    /// Depth-first search for a (sub)group by id, this group included.
    pub fn find_group(&self, group_id: &str) -> Option<&PermissionGroupNode> {
        if self.id == group_id {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            PermissionNode::Group(group) => group.find_group(group_id),
            PermissionNode::Permission { .. } => None,
        })
    }
}

/// The ordered permission taxonomy an admin screen renders. Fixed at
/// construction; the evaluator never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionTree {
    pub groups: Vec<PermissionGroupNode>,
}

impl PermissionTree {
    pub fn new(groups: Vec<PermissionGroupNode>) -> Self {
        Self { groups }
    }

    /// The built-in taxonomy. Enterprise licenses extend it with the
    /// playbook groups.
    pub fn standard(tier: LicenseTier) -> Self {
        use PermissionNode as N;

        let mut groups = vec![
            PermissionGroupNode::new(
                "teams",
                vec![
                    N::group(PermissionGroupNode::combined(
                        "send_invites",
                        vec![
                            N::permission("invite_user"),
                            N::permission("add_user_to_team"),
                        ],
                    )),
                    N::permission("create_team"),
                ],
            ),
            PermissionGroupNode::new(
                "public_channel",
                vec![
                    N::permission("create_public_channel"),
                    N::permission("manage_public_channel_properties"),
                    N::permission("manage_public_channel_members"),
                    N::permission("delete_public_channel"),
                    N::permission("convert_public_channel_to_private"),
                ],
            ),
            PermissionGroupNode::new(
                "private_channel",
                vec![
                    N::permission("create_private_channel"),
                    N::permission("manage_private_channel_properties"),
                    N::permission("manage_private_channel_members"),
                    N::permission("convert_private_channel_to_public"),
                    N::permission("delete_private_channel"),
                ],
            ),
            PermissionGroupNode::new(
                "posts",
                vec![
                    N::group(PermissionGroupNode::combined(
                        "edit_posts",
                        vec![
                            N::permission("edit_post"),
                            N::permission("edit_others_posts"),
                        ],
                    )),
                    N::group(PermissionGroupNode::combined(
                        "delete_posts",
                        vec![
                            N::permission("delete_post"),
                            N::permission("delete_others_posts"),
                        ],
                    )),
                    N::group(PermissionGroupNode::combined(
                        "reactions",
                        vec![
                            N::permission("add_reaction"),
                            N::permission("remove_reaction"),
                        ],
                    )),
                    N::permission("use_channel_mentions"),
                    N::permission("use_group_mentions"),
                ],
            ),
            PermissionGroupNode::new(
                "integrations",
                vec![
                    N::permission("manage_incoming_webhooks"),
                    N::permission("manage_outgoing_webhooks"),
                    N::permission("manage_slash_commands"),
                    N::permission("manage_oauth"),
                    N::permission("create_emojis"),
                    N::permission("delete_emojis"),
                    N::permission("delete_others_emojis"),
                ],
            ),
            PermissionGroupNode::new(
                "custom_groups",
                vec![
                    N::permission("create_custom_group"),
                    N::permission("edit_custom_group"),
                    N::permission("delete_custom_group"),
                    N::permission("manage_custom_group_members"),
                ],
            ),
        ];

        if tier >= LicenseTier::Enterprise {
            groups.push(PermissionGroupNode::new(
                "playbooks",
                vec![
                    N::group(PermissionGroupNode::combined(
                        "playbook_public",
                        vec![
                            N::permission("playbook_public_create"),
                            N::permission("playbook_public_manage_properties"),
                        ],
                    )),
                    N::group(PermissionGroupNode::combined(
                        "playbook_private",
                        vec![
                            N::permission("playbook_private_create"),
                            N::permission("playbook_private_manage_properties"),
                        ],
                    )),
                    N::permission("run_create"),
                ],
            ));
        }

        Self { groups }
    }

    pub fn find_group(&self, group_id: &str) -> Option<&PermissionGroupNode> {
        self.groups.iter().find_map(|g| g.find_group(group_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tree_group_order() {
        let tree = PermissionTree::standard(LicenseTier::Professional);
        let ids: Vec<&str> = tree.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "teams",
                "public_channel",
                "private_channel",
                "posts",
                "integrations",
                "custom_groups"
            ]
        );
    }

    #[test]
    fn test_enterprise_license_extends_tree_with_playbooks() {
        let starter = PermissionTree::standard(LicenseTier::Starter);
        assert!(starter.find_group("playbooks").is_none());

        let enterprise = PermissionTree::standard(LicenseTier::Enterprise);
        let playbooks = enterprise.find_group("playbooks").unwrap();
        assert_eq!(playbooks.children.len(), 3);
    }

    #[test]
    fn test_find_nested_combined_group() {
        let tree = PermissionTree::standard(LicenseTier::Starter);
        let edit_posts = tree.find_group("edit_posts").unwrap();
        assert!(edit_posts.combined);
        assert_eq!(
            edit_posts.children,
            vec![
                PermissionNode::permission("edit_post"),
                PermissionNode::permission("edit_others_posts"),
            ]
        );
    }

    #[test]
    fn test_top_level_groups_are_not_combined() {
        let tree = PermissionTree::standard(LicenseTier::Enterprise);
        assert!(tree.groups.iter().all(|g| !g.combined));
    }
}
