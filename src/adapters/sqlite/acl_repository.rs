//! `acl_rows` repository backing the access-control lattice (component B).

use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::error::DomainResult;
use crate::domain::models::acl::{AccessContext, AclRow, Permission};

use super::{parse_datetime, parse_json_or_default};

#[derive(sqlx::FromRow)]
struct AclRowRecord {
    resource_id: String,
    owner: String,
    access_level: String,
    team_id: Option<String>,
    swarm_id: Option<String>,
    granted_permissions: String,
    blocked_agents: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AclRowRecord> for AclRow {
    type Error = crate::domain::error::DomainError;

    fn try_from(row: AclRowRecord) -> DomainResult<Self> {
        Ok(Self {
            resource_id: row.resource_id,
            owner: row.owner,
            access_level: parse_json_or_default(Some(format!("\"{}\"", row.access_level)))?,
            team_id: row.team_id,
            swarm_id: row.swarm_id,
            granted_permissions: parse_json_or_default(Some(row.granted_permissions))?,
            blocked_agents: parse_json_or_default(Some(row.blocked_agents))?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

pub struct SqliteAclRepository {
    pool: SqlitePool,
}

impl SqliteAclRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, acl: &AclRow) -> DomainResult<()> {
        let access_level = serde_json::to_string(&acl.access_level)?;
        let access_level = access_level.trim_matches('"').to_string();
        let granted = serde_json::to_string(&acl.granted_permissions)?;
        let blocked = serde_json::to_string(&acl.blocked_agents)?;

        sqlx::query(
            "INSERT INTO acl_rows (resource_id, owner, access_level, team_id, swarm_id, granted_permissions, blocked_agents, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(resource_id) DO UPDATE SET
                owner = excluded.owner,
                access_level = excluded.access_level,
                team_id = excluded.team_id,
                swarm_id = excluded.swarm_id,
                granted_permissions = excluded.granted_permissions,
                blocked_agents = excluded.blocked_agents,
                updated_at = excluded.updated_at",
        )
        .bind(&acl.resource_id)
        .bind(&acl.owner)
        .bind(&access_level)
        .bind(&acl.team_id)
        .bind(&acl.swarm_id)
        .bind(&granted)
        .bind(&blocked)
        .bind(acl.created_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find(&self, resource_id: &str) -> DomainResult<Option<AclRow>> {
        let row: Option<AclRowRecord> = sqlx::query_as("SELECT * FROM acl_rows WHERE resource_id = ?")
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AclRow::try_from).transpose()
    }

    pub async fn delete(&self, resource_id: &str) -> DomainResult<()> {
        sqlx::query("DELETE FROM acl_rows WHERE resource_id = ?")
            .bind(resource_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns `true` when there is no ACL row at all (unmanaged resource,
    /// always readable/writable by its owner check upstream) or the row
    /// permits `permission` for `ctx`.
    pub async fn check(
        &self,
        resource_id: &str,
        ctx: &AccessContext<'_>,
        permission: Permission,
    ) -> DomainResult<bool> {
        match self.find(resource_id).await? {
            Some(row) => Ok(row.permits(ctx, permission)),
            None => Ok(true),
        }
    }
}
