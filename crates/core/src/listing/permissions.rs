//! Permission catalogue table.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{cmp_text, matches_exact, matches_search, push_pair, ListFilters, ManagedResource};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSummary {
    pub id: DbId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub roles_count: u64,
    pub created_at: Timestamp,
}

impl PermissionSummary {
    /// Explicit module, or the first segment of the code.
    pub fn module_name(&self) -> &str {
        self.module
            .as_deref()
            .unwrap_or_else(|| self.code.split('.').next().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionFilters {
    pub search: String,
    pub module: Option<String>,
}

impl ListFilters for PermissionFilters {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "search", Some(self.search.as_str()));
        push_pair(&mut pairs, "module", self.module.as_deref());
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSortField {
    Code,
    Name,
    Module,
    RolesCount,
}

impl FromStr for PermissionSortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "name" => Ok(Self::Name),
            "module" => Ok(Self::Module),
            "roles_count" => Ok(Self::RolesCount),
            _ => Err(CoreError::UnknownValue {
                kind: "permission sort field",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionStats {
    pub total: u64,
    pub modules: u64,
    pub unassigned: u64,
}

pub struct Permissions;

impl ManagedResource for Permissions {
    type Item = PermissionSummary;
    type Filters = PermissionFilters;
    type SortField = PermissionSortField;
    type Stats = PermissionStats;

    const NAME: &'static str = "permissions";
    const PATH: &'static str = "permissions";
    const DEFAULT_SORT: PermissionSortField = PermissionSortField::Code;

    fn matches(filters: &PermissionFilters, permission: &PermissionSummary) -> bool {
        matches_search(
            &filters.search,
            &[permission.code.as_str(), permission.name.as_str()],
        ) && matches_exact(filters.module.as_deref(), permission.module_name())
    }

    fn compare(field: PermissionSortField, a: &PermissionSummary, b: &PermissionSummary) -> Ordering {
        match field {
            PermissionSortField::Code => a.code.cmp(&b.code),
            PermissionSortField::Name => cmp_text(&a.name, &b.name),
            PermissionSortField::Module => a.module_name().cmp(b.module_name()),
            PermissionSortField::RolesCount => a.roles_count.cmp(&b.roles_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(code: &str, module: Option<&str>) -> PermissionSummary {
        PermissionSummary {
            id: 1,
            code: code.to_string(),
            name: code.to_string(),
            module: module.map(str::to_string),
            roles_count: 0,
            created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn module_falls_back_to_code_prefix() {
        assert_eq!(permission("users.view", None).module_name(), "users");
        assert_eq!(permission("users.view", Some("iam")).module_name(), "iam");
    }

    #[test]
    fn module_filter_uses_derived_module() {
        let filters = PermissionFilters {
            module: Some("billing".into()),
            ..Default::default()
        };
        assert!(Permissions::matches(&filters, &permission("billing.refund", None)));
        assert!(!Permissions::matches(&filters, &permission("users.view", None)));
    }
}
