//! Permission codes and the user permission resolver.
//!
//! A user's visible permission list is the union of the codes granted to the
//! user directly and the codes derived from the user's roles. Derivation is a
//! fallback chain rather than a union of every source:
//!
//! 1. direct codes (`user.permissions`, empty when absent);
//! 2. the user's [`PermissionAggregator`], when it has one;
//! 3. only if step 2 produced nothing and the `roles` relation is loaded,
//!    the flattened `role.permissions[*].code` of every loaded role;
//! 4. direct codes followed by the derived codes, first occurrence wins.
//!
//! Steps 2 and 3 return [`AggregationError`] instead of failing the caller.
//! On error the resolver returns the direct codes unchanged.
//!
//! An aggregator that returns an empty list is indistinguishable from "no
//! aggregator" and falls through to step 3. The console backend behaves the
//! same way, so this is kept for compatibility even though a user whose role
//! set genuinely grants nothing will be re-derived from the loaded roles.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Relation};

// ---------------------------------------------------------------------------
// Well-known codes
// ---------------------------------------------------------------------------

/// Permission codes checked by the console itself.
pub mod codes {
    pub const USERS_VIEW: &str = "users.view";
    pub const USERS_CREATE: &str = "users.create";
    pub const USERS_UPDATE: &str = "users.update";
    pub const USERS_DELETE: &str = "users.delete";

    pub const ORGANIZATIONS_VIEW: &str = "organizations.view";
    pub const ORGANIZATIONS_MANAGE: &str = "organizations.manage";

    pub const ROLES_VIEW: &str = "roles.view";
    pub const ROLES_MANAGE: &str = "roles.manage";

    pub const PERMISSIONS_VIEW: &str = "permissions.view";
    pub const PERMISSIONS_MANAGE: &str = "permissions.manage";

    pub const CLIENTS_VIEW: &str = "clients.view";
    pub const CLIENTS_MANAGE: &str = "clients.manage";

    /// Grants every permission.
    pub const WILDCARD: &str = "*";
}

/// `module.action` with lowercase segments, e.g. `users.create` or
/// `billing.invoices.export`.
const CODE_PATTERN: &str = r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)+$";

pub(crate) static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CODE_PATTERN).expect("valid regex"));

/// Check whether `code` is a well-formed permission code.
pub fn is_valid_code(code: &str) -> bool {
    CODE_RE.is_match(code)
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: DbId,
    /// Canonical identifier used by authorization checks and the UI.
    pub code: String,
    /// Display label.
    pub name: String,
    #[serde(default)]
    pub module: Option<String>,
}

/// Attributes stored on the user/role join, not on either entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePivot {
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub permissions: Relation<Vec<Permission>>,
    /// Present when the role was reached through a user.
    #[serde(default)]
    pub pivot: Option<RolePivot>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("relation `{relation}` is not loaded on {owner} {id}")]
    RelationNotLoaded {
        relation: &'static str,
        owner: &'static str,
        id: DbId,
    },

    #[error("permission aggregation failed: {0}")]
    Failed(String),
}

/// Something that can list every permission a user holds through its roles.
pub trait PermissionAggregator {
    fn all_permissions(&self) -> Result<Vec<Permission>, AggregationError>;
}

/// Whether a user can aggregate role-derived permissions.
pub enum PermissionSource<'a> {
    Aggregator(Box<dyn PermissionAggregator + 'a>),
    Basic,
}

/// Aggregator over an already-loaded role collection.
pub struct RolePermissionAggregator<'a> {
    roles: &'a [Role],
}

impl<'a> RolePermissionAggregator<'a> {
    pub fn new(roles: &'a [Role]) -> Self {
        Self { roles }
    }
}

impl PermissionAggregator for RolePermissionAggregator<'_> {
    fn all_permissions(&self) -> Result<Vec<Permission>, AggregationError> {
        let mut all = Vec::new();
        for role in self.roles {
            all.extend(role_permissions(role)?.iter().cloned());
        }
        Ok(all)
    }
}

fn role_permissions(role: &Role) -> Result<&[Permission], AggregationError> {
    role.permissions
        .loaded()
        .map(Vec::as_slice)
        .ok_or(AggregationError::RelationNotLoaded {
            relation: "permissions",
            owner: "role",
            id: role.id,
        })
}

/// Flatten `role.permissions[*].code` across `roles`, in role order.
pub fn flatten_role_permissions(roles: &[Role]) -> Result<Vec<String>, AggregationError> {
    let mut codes = Vec::new();
    for role in roles {
        codes.extend(role_permissions(role)?.iter().map(|p| p.code.clone()));
    }
    Ok(codes)
}

/// Derive role-based permission codes (steps 2 and 3 of the chain).
///
/// `loaded_roles` is `None` when the user's `roles` relation was not eager
/// loaded; in that case step 3 is skipped.
pub fn aggregate_permissions(
    source: &PermissionSource<'_>,
    loaded_roles: Option<&[Role]>,
) -> Result<Vec<String>, AggregationError> {
    let mut derived: Vec<String> = match source {
        PermissionSource::Aggregator(aggregator) => aggregator
            .all_permissions()?
            .into_iter()
            .map(|p| p.code)
            .collect(),
        PermissionSource::Basic => Vec::new(),
    };

    if derived.is_empty() {
        if let Some(roles) = loaded_roles {
            derived = flatten_role_permissions(roles)?;
        }
    }

    Ok(derived)
}

/// Resolve the permission codes visible for a user.
///
/// Never fails: an [`AggregationError`] degrades the result to `direct`,
/// returned exactly as given.
pub fn resolve_permissions(
    direct: &[String],
    source: &PermissionSource<'_>,
    loaded_roles: Option<&[Role]>,
) -> Vec<String> {
    match aggregate_permissions(source, loaded_roles) {
        Ok(derived) => dedup_first_occurrence(direct.iter().cloned().chain(derived)),
        Err(error) => {
            tracing::warn!(
                error = %error,
                direct_count = direct.len(),
                "Role permission aggregation failed, using direct permissions only",
            );
            direct.to_vec()
        }
    }
}

/// Remove duplicates, keeping the position of each code's first occurrence.
pub fn dedup_first_occurrence(codes: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Permission checks
// ---------------------------------------------------------------------------

/// A resolved permission list with wildcard-aware lookups.
///
/// A held code `users.*` grants every `users.` code; `*` grants everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(Vec<String>);

impl PermissionSet {
    pub fn new(codes: Vec<String>) -> Self {
        Self(dedup_first_occurrence(codes))
    }

    pub fn has(&self, code: &str) -> bool {
        self.0.iter().any(|held| grants(held, code))
    }

    pub fn has_any(&self, codes: &[&str]) -> bool {
        codes.iter().any(|code| self.has(code))
    }

    /// Return [`CoreError::Forbidden`] unless `code` is granted.
    pub fn require(&self, code: &str) -> Result<(), CoreError> {
        if self.has(code) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("Missing permission '{code}'")))
        }
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }
}

fn grants(held: &str, requested: &str) -> bool {
    if held == codes::WILDCARD || held == requested {
        return true;
    }
    match held.strip_suffix(".*") {
        Some(prefix) => requested
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.')),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
