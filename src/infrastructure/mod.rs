use crate::domain::role::Role;
use crate::domain::scheme::PermissionScheme;
use async_trait::async_trait;
use sqlx::Error;

pub type RepoResult<T> = Result<T, Error>;

// Infrastructure layer: database access and adapters

pub mod role_repository;
pub use role_repository::PostgresRoleRepository;

pub mod scheme_repository;
pub use scheme_repository::PostgresSchemeRepository;

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create_role(&self, name: &str, display_name: &str) -> RepoResult<Role>;
    async fn find_by_id(&self, role_id: &str) -> RepoResult<Option<Role>>;
    async fn list_roles(&self) -> RepoResult<Vec<Role>>;
    async fn save_permissions(&self, role_id: &str, permissions: &[String]) -> RepoResult<()>;
    async fn delete_role(&self, role_id: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait SchemeRepository: Send + Sync {
    async fn insert_scheme(&self, scheme: &PermissionScheme) -> RepoResult<()>;
    async fn find_by_id(&self, scheme_id: &str) -> RepoResult<Option<PermissionScheme>>;
    async fn list_schemes(&self) -> RepoResult<Vec<PermissionScheme>>;
    async fn patch_scheme(
        &self,
        scheme_id: &str,
        display_name: Option<&str>,
        description: Option<&str>,
    ) -> RepoResult<()>;
    async fn delete_scheme(&self, scheme_id: &str) -> RepoResult<()>;
    async fn attach_team(&self, scheme_id: &str, team_id: &str) -> RepoResult<()>;
    async fn detach_team(&self, scheme_id: &str, team_id: &str) -> RepoResult<()>;
    async fn list_teams(&self, scheme_id: &str) -> RepoResult<Vec<String>>;
}

pub struct InMemoryRoleRepository {
    pub roles: std::sync::Mutex<Vec<Role>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self {
            roles: std::sync::Mutex::new(vec![]),
        }
    }

    pub fn with_roles(roles: Vec<Role>) -> Self {
        Self {
            roles: std::sync::Mutex::new(roles),
        }
    }
}

impl Default for InMemoryRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create_role(&self, name: &str, display_name: &str) -> RepoResult<Role> {
        let role = Role::new(
            uuid::Uuid::new_v4().to_string(),
            name.to_string(),
            display_name.to_string(),
        );
        self.roles.lock().unwrap().push(role.clone());
        Ok(role)
    }

    async fn find_by_id(&self, role_id: &str) -> RepoResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == role_id)
            .cloned())
    }

    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        Ok(self.roles.lock().unwrap().clone())
    }

    async fn save_permissions(&self, role_id: &str, permissions: &[String]) -> RepoResult<()> {
        let mut roles = self.roles.lock().unwrap();
        let role = roles
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or(Error::RowNotFound)?;
        role.permissions = permissions.to_vec();
        Ok(())
    }

    async fn delete_role(&self, role_id: &str) -> RepoResult<()> {
        self.roles.lock().unwrap().retain(|r| r.id != role_id);
        Ok(())
    }
}

pub struct InMemorySchemeRepository {
    pub schemes: std::sync::Mutex<Vec<PermissionScheme>>,
    pub scheme_teams: std::sync::Mutex<Vec<(String, String)>>, // (scheme_id, team_id)
}

impl InMemorySchemeRepository {
    pub fn new() -> Self {
        Self {
            schemes: std::sync::Mutex::new(vec![]),
            scheme_teams: std::sync::Mutex::new(vec![]),
        }
    }
}

impl Default for InMemorySchemeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemeRepository for InMemorySchemeRepository {
    async fn insert_scheme(&self, scheme: &PermissionScheme) -> RepoResult<()> {
        self.schemes.lock().unwrap().push(scheme.clone());
        Ok(())
    }

    async fn find_by_id(&self, scheme_id: &str) -> RepoResult<Option<PermissionScheme>> {
        Ok(self
            .schemes
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == scheme_id)
            .cloned())
    }

    async fn list_schemes(&self) -> RepoResult<Vec<PermissionScheme>> {
        Ok(self.schemes.lock().unwrap().clone())
    }

    async fn patch_scheme(
        &self,
        scheme_id: &str,
        display_name: Option<&str>,
        description: Option<&str>,
    ) -> RepoResult<()> {
        let mut schemes = self.schemes.lock().unwrap();
        let scheme = schemes
            .iter_mut()
            .find(|s| s.id == scheme_id)
            .ok_or(Error::RowNotFound)?;
        if let Some(display_name) = display_name {
            scheme.display_name = display_name.to_string();
        }
        if let Some(description) = description {
            scheme.description = Some(description.to_string());
        }
        Ok(())
    }

    async fn delete_scheme(&self, scheme_id: &str) -> RepoResult<()> {
        self.schemes.lock().unwrap().retain(|s| s.id != scheme_id);
        self.scheme_teams
            .lock()
            .unwrap()
            .retain(|(sid, _)| sid != scheme_id);
        Ok(())
    }

    async fn attach_team(&self, scheme_id: &str, team_id: &str) -> RepoResult<()> {
        let mut scheme_teams = self.scheme_teams.lock().unwrap();
        if !scheme_teams
            .iter()
            .any(|(sid, tid)| sid == scheme_id && tid == team_id)
        {
            scheme_teams.push((scheme_id.to_string(), team_id.to_string()));
        }
        Ok(())
    }

    async fn detach_team(&self, scheme_id: &str, team_id: &str) -> RepoResult<()> {
        self.scheme_teams
            .lock()
            .unwrap()
            .retain(|(sid, tid)| !(sid == scheme_id && tid == team_id));
        Ok(())
    }

    async fn list_teams(&self, scheme_id: &str) -> RepoResult<Vec<String>> {
        Ok(self
            .scheme_teams
            .lock()
            .unwrap()
            .iter()
            .filter(|(sid, _)| sid == scheme_id)
            .map(|(_, tid)| tid.clone())
            .collect())
    }
}
