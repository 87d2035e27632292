//! Access control lattice (component B).
//!
//! Permission is monotone: an agent is allowed if ANY rule grants it, and
//! a block always wins regardless of which rule would otherwise grant
//! access (§4.1 "Blocks override grants").

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Five-level access lattice for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Private,
    Team,
    Swarm,
    Public,
    System,
}

/// A permission an agent can be granted on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Delete,
    Share,
}

/// Row-level ACL entry for a single resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclRow {
    pub resource_id: String,
    pub owner: String,
    pub access_level: AccessLevel,
    pub team_id: Option<String>,
    pub swarm_id: Option<String>,
    /// Per-agent grants, each a set of permissions.
    pub granted_permissions: HashMap<String, HashSet<Permission>>,
    pub blocked_agents: HashSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Context describing the caller and resource for a permission check.
pub struct AccessContext<'a> {
    pub agent_id: &'a str,
    pub is_system_agent: bool,
    pub team_id: Option<&'a str>,
    pub swarm_id: Option<&'a str>,
}

impl AclRow {
    /// Evaluate whether `ctx` may exercise `permission` on this row, per the
    /// lattice described in §4.1.
    #[must_use]
    pub fn permits(&self, ctx: &AccessContext<'_>, permission: Permission) -> bool {
        if self.blocked_agents.contains(ctx.agent_id) {
            return false;
        }

        if ctx.agent_id == self.owner {
            return true;
        }

        let lattice_allows = match self.access_level {
            AccessLevel::Public => true,
            AccessLevel::System => ctx.is_system_agent,
            AccessLevel::Swarm => {
                self.swarm_id.is_some() && self.swarm_id.as_deref() == ctx.swarm_id
            }
            AccessLevel::Team => self.team_id.is_some() && self.team_id.as_deref() == ctx.team_id,
            AccessLevel::Private => false,
        };

        if lattice_allows {
            return true;
        }

        self.granted_permissions
            .get(ctx.agent_id)
            .is_some_and(|perms| perms.contains(&permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(access_level: AccessLevel) -> AclRow {
        AclRow {
            resource_id: "r1".into(),
            owner: "agent-a".into(),
            access_level,
            team_id: Some("team-1".into()),
            swarm_id: Some("swarm-1".into()),
            granted_permissions: HashMap::new(),
            blocked_agents: HashSet::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_always_permitted() {
        let acl = row(AccessLevel::Private);
        let ctx = AccessContext { agent_id: "agent-a", is_system_agent: false, team_id: None, swarm_id: None };
        assert!(acl.permits(&ctx, Permission::Write));
    }

    #[test]
    fn private_denies_non_owner_with_no_grant() {
        let acl = row(AccessLevel::Private);
        let ctx = AccessContext { agent_id: "agent-b", is_system_agent: false, team_id: None, swarm_id: None };
        assert!(!acl.permits(&ctx, Permission::Read));
    }

    #[test]
    fn team_scope_matches_only_shared_team() {
        let acl = row(AccessLevel::Team);
        let same_team = AccessContext { agent_id: "agent-b", is_system_agent: false, team_id: Some("team-1"), swarm_id: None };
        let other_team = AccessContext { agent_id: "agent-c", is_system_agent: false, team_id: Some("team-2"), swarm_id: None };
        assert!(acl.permits(&same_team, Permission::Read));
        assert!(!acl.permits(&other_team, Permission::Read));
    }

    #[test]
    fn block_overrides_grant_and_ownership_lattice() {
        let mut acl = row(AccessLevel::Public);
        acl.blocked_agents.insert("agent-b".into());
        let ctx = AccessContext { agent_id: "agent-b", is_system_agent: false, team_id: None, swarm_id: None };
        assert!(!acl.permits(&ctx, Permission::Read));
    }

    #[test]
    fn explicit_grant_permits_private_resource() {
        let mut acl = row(AccessLevel::Private);
        acl.granted_permissions.insert("agent-b".into(), HashSet::from([Permission::Read]));
        let ctx = AccessContext { agent_id: "agent-b", is_system_agent: false, team_id: None, swarm_id: None };
        assert!(acl.permits(&ctx, Permission::Read));
        assert!(!acl.permits(&ctx, Permission::Write));
    }
}
