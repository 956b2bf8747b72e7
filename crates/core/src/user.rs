//! User entity as delivered by the console backend.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::permissions::{
    resolve_permissions, PermissionSet, PermissionSource, Role, RolePermissionAggregator,
};
use crate::types::{DbId, Relation, Timestamp};

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";
pub const STATUS_SUSPENDED: &str = "suspended";
pub const STATUS_PENDING: &str = "pending";

pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_INACTIVE, STATUS_SUSPENDED, STATUS_PENDING];

/// Validate that a user status is one of the known values.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid user status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub id: DbId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub last_activity_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Primary role code.
    pub role: String,
    pub status: String,
    #[serde(default)]
    pub email_verified_at: Option<Timestamp>,
    #[serde(default)]
    pub two_factor_enabled: bool,
    /// Codes granted to the user directly, independent of any role.
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(default)]
    pub last_login_at: Option<Timestamp>,
    #[serde(default)]
    pub last_login_ip: Option<String>,
    #[serde(default)]
    pub failed_login_attempts: u32,
    #[serde(default)]
    pub password_changed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    #[serde(default)]
    pub roles: Relation<Vec<Role>>,
    #[serde(default)]
    pub organization: Relation<Option<OrganizationRef>>,
    #[serde(default)]
    pub active_sessions: Relation<Vec<ActiveSession>>,
}

impl User {
    /// Direct permission codes, empty when the attribute is absent.
    pub fn direct_permissions(&self) -> &[String] {
        self.permissions.as_deref().unwrap_or_default()
    }

    /// Role-backed aggregation is only available when `roles` was eager loaded.
    pub fn permission_source(&self) -> PermissionSource<'_> {
        match self.roles.loaded() {
            Some(roles) => {
                PermissionSource::Aggregator(Box::new(RolePermissionAggregator::new(roles)))
            }
            None => PermissionSource::Basic,
        }
    }

    /// Direct and role-derived codes, deduplicated in first-occurrence order.
    pub fn resolved_permissions(&self) -> Vec<String> {
        let source = self.permission_source();
        let loaded_roles = self.roles.loaded().map(Vec::as_slice);
        resolve_permissions(self.direct_permissions(), &source, loaded_roles)
    }

    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.username.clone(),
        }
    }

    /// The role flagged `is_primary` on its pivot, when roles are loaded.
    pub fn primary_role(&self) -> Option<&Role> {
        self.roles
            .loaded()?
            .iter()
            .find(|role| role.pivot.as_ref().is_some_and(|p| p.is_primary))
    }
}

/// The acting user on whose behalf a payload is rendered.
#[derive(Debug, Clone, Default)]
pub struct Principal {
    pub id: DbId,
    pub permissions: PermissionSet,
}

impl Principal {
    pub fn new(id: DbId, permissions: Vec<String>) -> Self {
        Self {
            id,
            permissions: PermissionSet::new(permissions),
        }
    }

    /// Build a principal from a fully resolved user.
    pub fn from_user(user: &User) -> Self {
        Self::new(user.id, user.resolved_permissions())
    }
}
