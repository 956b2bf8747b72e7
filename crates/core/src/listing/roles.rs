//! Role management table.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{cmp_text, matches_search, push_pair, ListFilters, ManagedResource};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: DbId,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub users_count: u64,
    #[serde(default)]
    pub permissions_count: u64,
    /// Seeded roles cannot be deleted.
    #[serde(default)]
    pub is_system: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFilters {
    pub search: String,
    pub is_system: Option<bool>,
}

impl ListFilters for RoleFilters {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "search", Some(self.search.as_str()));
        if let Some(is_system) = self.is_system {
            pairs.push(("is_system", u8::from(is_system).to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSortField {
    Name,
    Code,
    UsersCount,
    PermissionsCount,
    CreatedAt,
}

impl FromStr for RoleSortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "code" => Ok(Self::Code),
            "users_count" => Ok(Self::UsersCount),
            "permissions_count" => Ok(Self::PermissionsCount),
            "created_at" => Ok(Self::CreatedAt),
            _ => Err(CoreError::UnknownValue {
                kind: "role sort field",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleStats {
    pub total: u64,
    pub system: u64,
    pub custom: u64,
}

pub struct Roles;

impl ManagedResource for Roles {
    type Item = RoleSummary;
    type Filters = RoleFilters;
    type SortField = RoleSortField;
    type Stats = RoleStats;

    const NAME: &'static str = "roles";
    const PATH: &'static str = "roles";
    const DEFAULT_SORT: RoleSortField = RoleSortField::Name;

    fn matches(filters: &RoleFilters, role: &RoleSummary) -> bool {
        matches_search(
            &filters.search,
            &[
                role.name.as_str(),
                role.code.as_str(),
                role.description.as_deref().unwrap_or_default(),
            ],
        ) && filters.is_system.map_or(true, |wanted| wanted == role.is_system)
    }

    fn compare(field: RoleSortField, a: &RoleSummary, b: &RoleSummary) -> Ordering {
        match field {
            RoleSortField::Name => cmp_text(&a.name, &b.name),
            RoleSortField::Code => a.code.cmp(&b.code),
            RoleSortField::UsersCount => a.users_count.cmp(&b.users_count),
            RoleSortField::PermissionsCount => a.permissions_count.cmp(&b.permissions_count),
            RoleSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}
