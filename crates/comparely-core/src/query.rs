//! Catalogue query parameters and lightweight result rows.

use serde::{Deserialize, Serialize};

use crate::device::{CategoryId, DeviceId};

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;
pub const DEFAULT_AUTOCOMPLETE_LIMIT: usize = 10;

/// Filters for listing devices. Every field is optional; unset fields do not
/// constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFilter {
    /// Case-insensitive substring of name or brand.
    pub search: Option<String>,
    /// Exact brand, case-insensitive.
    pub brand: Option<String>,
    pub category_id: Option<CategoryId>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_year: Option<i32>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl DeviceFilter {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Criteria for the recommendation listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationCriteria {
    pub max_price: Option<f64>,
    pub category_id: Option<CategoryId>,
    pub min_release_year: Option<i32>,
    pub limit: Option<usize>,
}

impl RecommendationCriteria {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
    }
}

/// Search-as-you-type row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSuggestion {
    pub id: DeviceId,
    pub name: String,
    pub brand: String,
}
