//! Client-local sort state.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(CoreError::UnknownValue {
                kind: "sort order",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<F> {
    pub sort_by: F,
    pub sort_order: SortOrder,
}

/// A sort request from the table header. Without an explicit order the
/// request toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortUpdate<F> {
    pub sort_by: F,
    pub sort_order: Option<SortOrder>,
}

impl<F> SortUpdate<F> {
    pub fn toggle(sort_by: F) -> Self {
        Self {
            sort_by,
            sort_order: None,
        }
    }

    pub fn explicit(sort_by: F, sort_order: SortOrder) -> Self {
        Self {
            sort_by,
            sort_order: Some(sort_order),
        }
    }
}

impl<F: Copy + Eq> SortState<F> {
    pub fn new(sort_by: F) -> Self {
        Self {
            sort_by,
            sort_order: SortOrder::Asc,
        }
    }

    /// Same field flips the order; a different field starts ascending.
    pub fn toggle(&mut self, field: F) {
        if field == self.sort_by {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_by = field;
            self.sort_order = SortOrder::Asc;
        }
    }

    pub fn set(&mut self, field: F, order: SortOrder) {
        self.sort_by = field;
        self.sort_order = order;
    }

    pub fn apply(&mut self, update: SortUpdate<F>) {
        match update.sort_order {
            Some(order) => self.set(update.sort_by, order),
            None => self.toggle(update.sort_by),
        }
    }
}
