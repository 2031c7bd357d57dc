use crate::domain::role::Role;
use crate::infrastructure::{RepoResult, RoleRepository};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{error, instrument};

#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
    pub pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_permissions(&self, role_id: &str) -> RepoResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT permission FROM role_permissions WHERE role_id = $1 ORDER BY ordinal",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| row.get("permission")).collect())
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    #[instrument(skip(self))]
    async fn create_role(&self, name: &str, display_name: &str) -> RepoResult<Role> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO roles (id, name, display_name) VALUES ($1, $2, $3)")
            .bind(&id)
            .bind(name)
            .bind(display_name)
            .execute(&self.pool)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create role"))?;
        Ok(Role::new(id, name.to_string(), display_name.to_string()))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, role_id: &str) -> RepoResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, display_name FROM roles WHERE id = $1",
        )
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await?;
        match role {
            Some(role) => {
                let permissions = self.load_permissions(&role.id).await?;
                Ok(Some(role.with_permissions(permissions)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, display_name FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.load_permissions(&role.id).await?;
            out.push(role.with_permissions(permissions));
        }
        Ok(out)
    }

    #[instrument(skip(self, permissions))]
    async fn save_permissions(&self, role_id: &str, permissions: &[String]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        for (ordinal, permission) in permissions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission, ordinal) VALUES ($1, $2, $3)",
            )
            .bind(role_id)
            .bind(permission)
            .bind(ordinal as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await.inspect_err(|e| {
            error!(error = %e, role_id, "Failed to save role permissions");
        })
    }

    #[instrument(skip(self))]
    async fn delete_role(&self, role_id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to delete role"))?;
        Ok(())
    }
}
