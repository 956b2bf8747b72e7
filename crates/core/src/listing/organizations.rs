//! Organization (tenant) management table.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{cmp_text, matches_exact, matches_search, push_pair, ListFilters, ManagedResource};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub status: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub users_count: u64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationFilters {
    pub search: String,
    pub status: Option<String>,
    pub plan: Option<String>,
}

impl ListFilters for OrganizationFilters {
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
        push_pair(&mut pairs, "plan", self.plan.as_deref());
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationSortField {
    Name,
    Slug,
    Status,
    UsersCount,
    CreatedAt,
}

impl FromStr for OrganizationSortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "slug" => Ok(Self::Slug),
            "status" => Ok(Self::Status),
            "users_count" => Ok(Self::UsersCount),
            "created_at" => Ok(Self::CreatedAt),
            _ => Err(CoreError::UnknownValue {
                kind: "organization sort field",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub trial: u64,
}

pub struct Organizations;

impl ManagedResource for Organizations {
    type Item = Organization;
    type Filters = OrganizationFilters;
    type SortField = OrganizationSortField;
    type Stats = OrganizationStats;

    const NAME: &'static str = "organizations";
    const PATH: &'static str = "organizations";
    const DEFAULT_SORT: OrganizationSortField = OrganizationSortField::Name;

    fn matches(filters: &OrganizationFilters, org: &Organization) -> bool {
        matches_search(&filters.search, &[org.name.as_str(), org.slug.as_str()])
            && matches_exact(filters.status.as_deref(), org.status.as_str())
            && (filters.plan.is_none() || filters.plan == org.plan)
    }

    fn compare(field: OrganizationSortField, a: &Organization, b: &Organization) -> Ordering {
        match field {
            OrganizationSortField::Name => cmp_text(&a.name, &b.name),
            OrganizationSortField::Slug => a.slug.cmp(&b.slug),
            OrganizationSortField::Status => a.status.cmp(&b.status),
            OrganizationSortField::UsersCount => a.users_count.cmp(&b.users_count),
            OrganizationSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(name: &str, plan: Option<&str>) -> Organization {
        Organization {
            id: 1,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            status: "active".to_string(),
            plan: plan.map(str::to_string),
            users_count: 3,
            created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn plan_filter_requires_match() {
        let filters = OrganizationFilters {
            plan: Some("enterprise".into()),
            ..Default::default()
        };
        assert!(Organizations::matches(&filters, &org("Acme", Some("enterprise"))));
        assert!(!Organizations::matches(&filters, &org("Acme", None)));
    }

    #[test]
    fn search_matches_slug() {
        let filters = OrganizationFilters {
            search: "big-co".into(),
            ..Default::default()
        };
        assert!(Organizations::matches(&filters, &org("Big Co", None)));
    }
}
