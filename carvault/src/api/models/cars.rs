//! API request/response models for cars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::cars::ListOptions;
use crate::db::models::cars::{CarDBResponse, SortField, SortOrder};
use crate::types::{CarId, UserId};

/// Car fields supplied on create and full replace.
///
/// Unknown fields (including any attempt to set `owner`) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CarRequest {
    /// 3-100 characters after trimming
    pub title: String,
    /// At least 10 characters after trimming
    pub description: String,
    /// At least one non-empty tag
    pub tags: Vec<String>,
    /// 1-10 absolute http(s) image URLs
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CarId,
    #[schema(value_type = String, format = "uuid")]
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CarDBResponse> for CarResponse {
    fn from(car: CarDBResponse) -> Self {
        Self {
            id: car.id,
            owner: car.owner_id,
            title: car.title,
            description: car.description,
            tags: car.tags,
            images: car.images,
            created_at: car.created_at,
            updated_at: car.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteCarResponse {
    pub message: String,
}

/// Split a comma-separated tag list.
fn split_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|raw| raw.split(',').map(str::to_string).collect()).unwrap_or_default()
}

/// Query parameters for `GET /api/cars`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCarsQuery {
    /// Field to sort by (`createdAt`, `updatedAt` or `title`; default `createdAt`)
    pub sort: Option<SortField>,
    /// `asc` or `desc` (default `desc`)
    pub order: Option<SortOrder>,
    /// Comma-separated tags; cars must carry all of them
    pub tags: Option<String>,
    /// Optional free-text search, same as `q` on `/api/cars/search`
    pub search: Option<String>,
}

impl From<ListCarsQuery> for ListOptions {
    fn from(query: ListCarsQuery) -> Self {
        Self {
            search: query.search,
            tags: split_tags(query.tags),
            sort: query.sort.unwrap_or_default(),
            order: query.order.unwrap_or_default(),
        }
    }
}

/// Query parameters for `GET /api/cars/search`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchCarsQuery {
    /// Free-text query matched against title, description and tags
    pub q: Option<String>,
    /// Comma-separated tags; cars must carry all of them
    pub tags: Option<String>,
}

impl From<SearchCarsQuery> for ListOptions {
    fn from(query: SearchCarsQuery) -> Self {
        Self {
            search: query.q,
            tags: split_tags(query.tags),
            ..Default::default()
        }
    }
}
