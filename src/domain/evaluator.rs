use crate::domain::permission::{PermissionCatalog, Scope};
use crate::domain::permission_tree::PermissionNode;
use crate::domain::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tri-state status of a group row: fully granted, partially granted, or
/// none granted. An empty grant set and "unchecked" are the same state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Checked,
    Intermediate,
    Unchecked,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Checked => "checked",
            GroupStatus::Intermediate => "intermediate",
            GroupStatus::Unchecked => "unchecked",
        }
    }
}

/// Grant set remembered across a single toggle-all gesture so a later
/// toggle can restore the previous partial selection instead of forcing
/// everything on. Threaded through `toggle_group` by the caller; never
/// stored by the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToggleMemory {
    pub previous_permissions: Vec<String>,
}

impl ToggleMemory {
    pub fn remember(permissions: &[String]) -> Self {
        Self {
            previous_permissions: permissions.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.previous_permissions.is_empty()
    }

    fn contains(&self, code: &str) -> bool {
        self.previous_permissions.iter().any(|p| p == code)
    }
}

/// Result of a group toggle: the codes whose membership the caller must
/// flip, and the memory to thread into the next toggle on the same group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupToggle {
    pub to_toggle: Vec<String>,
    pub memory: ToggleMemory,
}

/// Pure evaluation of a permission tree under a role/scope/parent-role
/// context. Holds only borrows; every answer is a function of its inputs,
/// so it is safe to rebuild per render or per request.
pub struct TreeEvaluator<'a> {
    catalog: &'a PermissionCatalog,
    scope: Scope,
    role: &'a Role,
    granted: HashSet<&'a str>,
    inherited: HashSet<&'a str>,
}

impl<'a> TreeEvaluator<'a> {
    pub fn new(catalog: &'a PermissionCatalog, scope: Scope, role: &'a Role) -> Self {
        Self {
            catalog,
            scope,
            role,
            granted: role.permissions.iter().map(String::as_str).collect(),
            inherited: HashSet::new(),
        }
    }

    /// Adds an inherited scheme whose grants are always active and never
    /// togglable from this screen.
    pub fn with_parent_role(mut self, parent_role: &'a Role) -> Self {
        self.inherited = parent_role.permissions.iter().map(String::as_str).collect();
        self
    }

    /// Whether `code` is visible under the evaluation scope. Codes the
    /// catalog does not know are never in scope.
    pub fn is_in_scope(&self, code: &str) -> bool {
        self.catalog
            .scope_of(code)
            .is_some_and(|declared| self.scope.admits(declared))
    }

    /// Whether `code` is granted by the inherited scheme.
    pub fn from_parent(&self, code: &str) -> bool {
        self.inherited.contains(code)
    }

    fn granted_by_role(&self, code: &str) -> bool {
        self.granted.contains(code)
    }

    /// Recursive tri-state aggregation. An intermediate child decides the
    /// parent immediately; out-of-scope permissions count toward neither
    /// flag.
    pub fn status(&self, nodes: &[PermissionNode]) -> GroupStatus {
        let mut any_checked = false;
        let mut any_unchecked = false;
        for node in nodes {
            match node {
                PermissionNode::Permission { code } => {
                    if !self.is_in_scope(code) {
                        continue;
                    }
                    if self.from_parent(code) || self.granted_by_role(code) {
                        any_checked = true;
                    } else {
                        any_unchecked = true;
                    }
                }
                PermissionNode::Group(group) => match self.status(&group.children) {
                    GroupStatus::Intermediate => return GroupStatus::Intermediate,
                    GroupStatus::Checked => any_checked = true,
                    GroupStatus::Unchecked => any_unchecked = true,
                },
            }
        }
        if any_checked && any_unchecked {
            GroupStatus::Intermediate
        } else if any_checked {
            GroupStatus::Checked
        } else {
            GroupStatus::Unchecked
        }
    }

    /// Whether the subtree contains at least one in-scope permission.
    /// Groups where this is false render nothing at all.
    pub fn has_permissions_on_scope(&self, nodes: &[PermissionNode]) -> bool {
        nodes.iter().any(|node| match node {
            PermissionNode::Permission { code } => self.is_in_scope(code),
            PermissionNode::Group(group) => self.has_permissions_on_scope(&group.children),
        })
    }

    /// Whether every in-scope permission in the subtree comes from the
    /// inherited scheme. Such a group is locked: nothing in it can be
    /// toggled from this screen.
    pub fn all_permissions_from_parent(&self, nodes: &[PermissionNode]) -> bool {
        nodes.iter().all(|node| match node {
            PermissionNode::Permission { code } => {
                !self.is_in_scope(code) || self.from_parent(code)
            }
            PermissionNode::Group(group) => self.all_permissions_from_parent(&group.children),
        })
    }

    /// In-scope permissions of the subtree that are not parent-inherited,
    /// in depth-first tree order. These are the only codes a toggle may
    /// ever touch.
    pub fn togglable_permissions(&self, nodes: &[PermissionNode]) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_togglable(nodes, &mut out);
        out
    }

    fn collect_togglable(&self, nodes: &[PermissionNode], out: &mut Vec<String>) {
        for node in nodes {
            match node {
                PermissionNode::Permission { code } => {
                    if self.is_in_scope(code) && !self.from_parent(code) {
                        out.push(code.clone());
                    }
                }
                PermissionNode::Group(group) => self.collect_togglable(&group.children, out),
            }
        }
    }

    /// The toggle-all gesture, branching on the group's current status:
    ///
    /// * `checked`: turn off everything the role itself granted; the
    ///   memory is cleared.
    /// * `unchecked`: turn everything on, or restore the remembered
    ///   partial selection when memory is present; the memory is cleared.
    /// * `intermediate`: record the current grant set, then either fill
    ///   the gaps up to fully checked (no prior memory) or clear the
    ///   partial selection (prior memory present), alternating across
    ///   repeated clicks.
    ///
    /// Parent-inherited codes never appear in the result.
    pub fn toggle_group(&self, nodes: &[PermissionNode], memory: &ToggleMemory) -> GroupToggle {
        let togglable = self.togglable_permissions(nodes);
        match self.status(nodes) {
            GroupStatus::Checked => GroupToggle {
                to_toggle: togglable,
                memory: ToggleMemory::default(),
            },
            GroupStatus::Unchecked => {
                let to_toggle = if memory.is_empty() {
                    togglable
                } else {
                    togglable
                        .into_iter()
                        .filter(|code| memory.contains(code))
                        .collect()
                };
                GroupToggle {
                    to_toggle,
                    memory: ToggleMemory::default(),
                }
            }
            GroupStatus::Intermediate => {
                let to_toggle = if memory.is_empty() {
                    togglable
                        .into_iter()
                        .filter(|code| !self.granted_by_role(code))
                        .collect()
                } else {
                    togglable
                        .into_iter()
                        .filter(|code| self.granted_by_role(code))
                        .collect()
                };
                GroupToggle {
                    to_toggle,
                    memory: ToggleMemory::remember(&self.role.permissions),
                }
            }
        }
    }
}
