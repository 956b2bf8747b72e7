//! API client (OAuth application) management table.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{cmp_text, matches_exact, matches_search, push_pair, ListFilters, ManagedResource};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: DbId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    pub status: String,
    #[serde(default)]
    pub organization_id: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilters {
    pub search: String,
    pub status: Option<String>,
}

impl ListFilters for ClientFilters {
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
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSortField {
    Name,
    Email,
    Company,
    Status,
    CreatedAt,
}

impl FromStr for ClientSortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "company" => Ok(Self::Company),
            "status" => Ok(Self::Status),
            "created_at" => Ok(Self::CreatedAt),
            _ => Err(CoreError::UnknownValue {
                kind: "client sort field",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

pub struct Clients;

impl ManagedResource for Clients {
    type Item = Client;
    type Filters = ClientFilters;
    type SortField = ClientSortField;
    type Stats = ClientStats;

    const NAME: &'static str = "clients";
    const PATH: &'static str = "clients";
    const DEFAULT_SORT: ClientSortField = ClientSortField::Name;

    fn matches(filters: &ClientFilters, client: &Client) -> bool {
        matches_search(
            &filters.search,
            &[
                client.name.as_str(),
                client.email.as_str(),
                client.company.as_deref().unwrap_or_default(),
            ],
        ) && matches_exact(filters.status.as_deref(), client.status.as_str())
    }

    fn compare(field: ClientSortField, a: &Client, b: &Client) -> Ordering {
        match field {
            ClientSortField::Name => cmp_text(&a.name, &b.name),
            ClientSortField::Email => cmp_text(&a.email, &b.email),
            ClientSortField::Company => a.company.cmp(&b.company),
            ClientSortField::Status => a.status.cmp(&b.status),
            ClientSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}
