//! Serialized user payload returned by the user endpoints.
//!
//! Visibility gating (`security_info`, `can_edit`, `can_delete`) depends on
//! the acting principal, which is always passed in explicitly.

use serde::Serialize;

use crate::permissions::codes;
use crate::types::{DbId, Timestamp};
use crate::user::{ActiveSession, OrganizationRef, Principal, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRoleResource {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub scope: Option<String>,
    pub is_primary: bool,
}

/// Account security details, only rendered for the account owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityInfo {
    pub last_login_at: Option<Timestamp>,
    pub last_login_ip: Option<String>,
    pub failed_login_attempts: u32,
    pub password_changed_at: Option<Timestamp>,
    pub two_factor_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResource {
    pub id: DbId,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub role: String,
    pub status: String,
    pub email_verified: bool,
    pub two_factor_enabled: bool,
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<UserRoleResource>>,
    /// `Some(None)` renders as `null`: loaded, but the user has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Option<OrganizationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_sessions: Option<Vec<ActiveSession>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_info: Option<SecurityInfo>,
    pub can_edit: bool,
    pub can_delete: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserResource {
    /// Render `user` for `principal`. Without a principal nothing is editable
    /// and security details are withheld.
    pub fn build(user: &User, principal: Option<&Principal>) -> Self {
        let is_self = principal.is_some_and(|p| p.id == user.id);
        let can_edit = principal.is_some_and(|p| is_self || p.permissions.has(codes::USERS_UPDATE));
        let can_delete =
            principal.is_some_and(|p| !is_self && p.permissions.has(codes::USERS_DELETE));

        let roles = user.roles.loaded().map(|roles| {
            roles
                .iter()
                .map(|role| UserRoleResource {
                    id: role.id,
                    name: role.name.clone(),
                    code: role.code.clone(),
                    scope: role.pivot.as_ref().and_then(|p| p.scope.clone()),
                    is_primary: role.pivot.as_ref().is_some_and(|p| p.is_primary),
                })
                .collect()
        });

        let security_info = is_self.then(|| SecurityInfo {
            last_login_at: user.last_login_at,
            last_login_ip: user.last_login_ip.clone(),
            failed_login_attempts: user.failed_login_attempts,
            password_changed_at: user.password_changed_at,
            two_factor_enabled: user.two_factor_enabled,
        });

        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            role: user.role.clone(),
            status: user.status.clone(),
            email_verified: user.email_verified_at.is_some(),
            two_factor_enabled: user.two_factor_enabled,
            permissions: user.resolved_permissions(),
            roles,
            organization: user.organization.loaded().cloned(),
            active_sessions: user.active_sessions.loaded().cloned(),
            security_info,
            can_edit,
            can_delete,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
