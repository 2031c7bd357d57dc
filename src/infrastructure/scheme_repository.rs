use crate::domain::scheme::PermissionScheme;
use crate::infrastructure::{RepoResult, SchemeRepository};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{error, instrument};

#[derive(Debug, Clone)]
pub struct PostgresSchemeRepository {
    pub pool: PgPool,
}

impl PostgresSchemeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SCHEME_COLUMNS: &str = "id, display_name, description, default_team_admin_role, \
     default_team_user_role, default_channel_admin_role, default_channel_user_role";

#[async_trait]
impl SchemeRepository for PostgresSchemeRepository {
    #[instrument(skip(self, scheme))]
    async fn insert_scheme(&self, scheme: &PermissionScheme) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO schemes (id, display_name, description, default_team_admin_role, \
             default_team_user_role, default_channel_admin_role, default_channel_user_role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&scheme.id)
        .bind(&scheme.display_name)
        .bind(&scheme.description)
        .bind(&scheme.default_team_admin_role)
        .bind(&scheme.default_team_user_role)
        .bind(&scheme.default_channel_admin_role)
        .bind(&scheme.default_channel_user_role)
        .execute(&self.pool)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to insert scheme"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, scheme_id: &str) -> RepoResult<Option<PermissionScheme>> {
        sqlx::query_as::<_, PermissionScheme>(&format!(
            "SELECT {SCHEME_COLUMNS} FROM schemes WHERE id = $1"
        ))
        .bind(scheme_id)
        .fetch_optional(&self.pool)
        .await
    }

    #[instrument(skip(self))]
    async fn list_schemes(&self) -> RepoResult<Vec<PermissionScheme>> {
        sqlx::query_as::<_, PermissionScheme>(&format!(
            "SELECT {SCHEME_COLUMNS} FROM schemes ORDER BY display_name"
        ))
        .fetch_all(&self.pool)
        .await
    }

    #[instrument(skip(self))]
    async fn patch_scheme(
        &self,
        scheme_id: &str,
        display_name: Option<&str>,
        description: Option<&str>,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE schemes SET display_name = COALESCE($2, display_name), \
             description = COALESCE($3, description) WHERE id = $1",
        )
        .bind(scheme_id)
        .bind(display_name)
        .bind(description)
        .execute(&self.pool)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to patch scheme"))?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_scheme(&self, scheme_id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM scheme_teams WHERE scheme_id = $1")
            .bind(scheme_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM schemes WHERE id = $1")
            .bind(scheme_id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to delete scheme"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn attach_team(&self, scheme_id: &str, team_id: &str) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO scheme_teams (scheme_id, team_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(scheme_id)
        .bind(team_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn detach_team(&self, scheme_id: &str, team_id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM scheme_teams WHERE scheme_id = $1 AND team_id = $2")
            .bind(scheme_id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_teams(&self, scheme_id: &str) -> RepoResult<Vec<String>> {
        let rows = sqlx::query("SELECT team_id FROM scheme_teams WHERE scheme_id = $1")
            .bind(scheme_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("team_id")).collect())
    }
}
