use serde::{Deserialize, Serialize};

/// Role entity: a named grant set edited by the admin console.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[sqlx(skip)]
    pub permissions: Vec<String>,
}

impl Role {
    pub fn new(id: String, name: String, display_name: String) -> Self {
        Self {
            id,
            name,
            display_name,
            permissions: vec![],
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions.iter().any(|p| p == code)
    }

    /// Adds a permission to the role (if not already present).
    pub fn add_permission(&mut self, code: String) {
        if !self.has_permission(&code) {
            self.permissions.push(code);
        }
    }

    /// Removes a permission from the role.
    pub fn remove_permission(&mut self, code: &str) {
        self.permissions.retain(|p| p != code);
    }

    /// Flips membership for each code: present codes are removed, absent
    /// codes are added. The evaluator communicates every change as such a
    /// toggle list; it never hands back an absolute set.
    pub fn apply_toggles(&mut self, codes: &[String]) {
        for code in codes {
            if self.has_permission(code) {
                self.remove_permission(code);
            } else {
                self.permissions.push(code.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_role() -> Role {
        Role::new(
            "role1".to_string(),
            "team_user".to_string(),
            "Team User".to_string(),
        )
        .with_permissions(vec!["create_post".to_string()])
    }

    #[test]
    fn test_add_and_remove_permission() {
        let mut role = test_role();
        role.add_permission("edit_post".to_string());
        assert!(role.has_permission("edit_post"));
        role.add_permission("edit_post".to_string());
        assert_eq!(role.permissions.len(), 2);
        role.remove_permission("create_post");
        assert!(!role.has_permission("create_post"));
    }

    #[test]
    fn test_apply_toggles_flips_membership() {
        let mut role = test_role();
        role.apply_toggles(&["create_post".to_string(), "edit_post".to_string()]);
        assert!(!role.has_permission("create_post"));
        assert!(role.has_permission("edit_post"));

        role.apply_toggles(&["edit_post".to_string()]);
        assert!(role.permissions.is_empty());
    }
}
