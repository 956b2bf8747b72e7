//! User management table.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{cmp_text, matches_exact, matches_search, push_pair, ListFilters, ManagedResource};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: DbId,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub role: String,
    pub status: String,
    #[serde(default)]
    pub organization_id: Option<DbId>,
    #[serde(default)]
    pub email_verified_at: Option<Timestamp>,
    #[serde(default)]
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilters {
    pub search: String,
    pub status: Option<String>,
    pub role: Option<String>,
    pub organization_id: Option<DbId>,
}

impl ListFilters for UserFilters {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "search", Some(self.search.as_str()));
        push_pair(&mut pairs, "status", self.status.as_deref());
        push_pair(&mut pairs, "role", self.role.as_deref());
        if let Some(id) = self.organization_id {
            pairs.push(("organization_id", id.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Username,
    Email,
    Role,
    Status,
    CreatedAt,
    LastLoginAt,
}

impl FromStr for UserSortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" | "name" => Ok(Self::Username),
            "email" => Ok(Self::Email),
            "role" => Ok(Self::Role),
            "status" => Ok(Self::Status),
            "created_at" => Ok(Self::CreatedAt),
            "last_login_at" => Ok(Self::LastLoginAt),
            _ => Err(CoreError::UnknownValue {
                kind: "user sort field",
                value: s.to_string(),
            }),
        }
    }
}

/// Counters from `GET users/statistics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub suspended: u64,
    pub pending: u64,
    pub verified: u64,
}

pub struct Users;

impl ManagedResource for Users {
    type Item = UserSummary;
    type Filters = UserFilters;
    type SortField = UserSortField;
    type Stats = UserStats;

    const NAME: &'static str = "users";
    const PATH: &'static str = "users";
    const DEFAULT_SORT: UserSortField = UserSortField::CreatedAt;

    fn matches(filters: &UserFilters, user: &UserSummary) -> bool {
        matches_search(
            &filters.search,
            &[
                user.username.as_str(),
                user.email.as_str(),
                user.first_name.as_deref().unwrap_or_default(),
                user.last_name.as_deref().unwrap_or_default(),
            ],
        ) && matches_exact(filters.status.as_deref(), user.status.as_str())
            && matches_exact(filters.role.as_deref(), user.role.as_str())
            && (filters.organization_id.is_none() || filters.organization_id == user.organization_id)
    }

    fn compare(field: UserSortField, a: &UserSummary, b: &UserSummary) -> Ordering {
        match field {
            UserSortField::Username => cmp_text(&a.username, &b.username),
            UserSortField::Email => cmp_text(&a.email, &b.email),
            UserSortField::Role => a.role.cmp(&b.role),
            UserSortField::Status => a.status.cmp(&b.status),
            UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            UserSortField::LastLoginAt => a.last_login_at.cmp(&b.last_login_at),
        }
    }
}
