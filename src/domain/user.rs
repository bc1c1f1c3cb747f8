//! Principal model: users, roles and the full-access role set

use super::common::{OrganizationId, StringUuid, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Application roles carried by a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Root,
    AppAdmin,
    MetadataAdmin,
    OrgAdmin,
    OrgUser,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Root => "ROOT",
            Role::AppAdmin => "APP_ADMIN",
            Role::MetadataAdmin => "METADATA_ADMIN",
            Role::OrgAdmin => "ORG_ADMIN",
            Role::OrgUser => "ORG_USER",
            Role::Guest => "GUEST",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROOT" => Ok(Role::Root),
            "APP_ADMIN" => Ok(Role::AppAdmin),
            "METADATA_ADMIN" => Ok(Role::MetadataAdmin),
            "ORG_ADMIN" => Ok(Role::OrgAdmin),
            "ORG_USER" => Ok(Role::OrgUser),
            "GUEST" => Ok(Role::Guest),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// The principal a case ABAC snapshot is computed for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub name: Option<String>,
    pub roles: HashSet<Role>,
    pub is_active: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            organization_id: StringUuid::nil(),
            email: String::new(),
            name: None,
            roles: HashSet::new(),
            is_active: true,
        }
    }
}

/// Elevated roles for which policy resolution is skipped.
///
/// A principal holding any of these roles gets a full-access `CaseAbac`
/// without a single policy read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullAccessRoles(HashSet<Role>);

impl FullAccessRoles {
    pub fn new(roles: HashSet<Role>) -> Self {
        Self(roles)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn grants_full_access(&self, roles: &HashSet<Role>) -> bool {
        !self.0.is_disjoint(roles)
    }
}

impl Default for FullAccessRoles {
    fn default() -> Self {
        Self([Role::Root, Role::AppAdmin].into_iter().collect())
    }
}
