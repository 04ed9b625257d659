//! Storage models for cars.

use crate::types::{CarId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Storage request for creating a car. `owner_id` always comes from the resolved identity.
#[derive(Debug, Clone)]
pub struct CarCreateDBRequest {
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

/// Storage request for replacing a car's editable fields.
#[derive(Debug, Clone)]
pub struct CarUpdateDBRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

/// Stored car row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CarDBResponse {
    pub id: CarId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a car listing can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "title")]
    Title,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Listing filter. Every query is scoped to `owner_id`.
#[derive(Debug, Clone)]
pub struct CarFilter {
    pub owner_id: UserId,
    /// Free-text search; blank means no search
    pub search: Option<String>,
    /// Every tag must be present on a matching car
    pub tags: Vec<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl CarFilter {
    pub fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            search: None,
            tags: Vec::new(),
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }

    /// Lower-cased alphanumeric search terms. Empty when there is nothing to search for.
    pub fn search_terms(&self) -> Vec<String> {
        self.search.as_deref().map(tokenize).unwrap_or_default()
    }
}

/// Split text into lower-cased alphanumeric words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}
