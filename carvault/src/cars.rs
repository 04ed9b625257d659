//! Ownership-scoped car operations.
//!
//! [`CarRepository`] is the only way handlers touch cars. Each operation takes the caller's
//! [`Identity`]; the owner is stamped from it on create and is part of every lookup, so a car
//! owned by somebody else is reported as [`Error::NotFound`], never as forbidden.

use std::sync::Arc;

use tracing::instrument;

use crate::{
    api::models::cars::CarRequest,
    auth::current_user::Identity,
    db::{
        handlers::CarStore,
        models::cars::{CarCreateDBRequest, CarDBResponse, CarFilter, CarUpdateDBRequest, SortField, SortOrder},
    },
    errors::{Error, Result},
    types::{abbrev_uuid, CarId},
    validation::validate_car,
};

/// Listing options supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Free-text search. When non-blank, results are ordered by relevance and `sort` is ignored.
    pub search: Option<String>,
    /// Cars must carry every one of these tags
    pub tags: Vec<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl ListOptions {
    fn into_filter(self, identity: &Identity) -> CarFilter {
        CarFilter {
            owner_id: identity.id,
            search: self.search.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
            tags: self
                .tags
                .into_iter()
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect(),
            sort: self.sort,
            order: self.order,
        }
    }
}

#[derive(Clone)]
pub struct CarRepository {
    store: Arc<dyn CarStore>,
}

fn not_found(id: CarId) -> Error {
    Error::NotFound {
        resource: "Car".to_string(),
        id: id.to_string(),
    }
}

impl CarRepository {
    pub fn new(store: Arc<dyn CarStore>) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(owner_id = %abbrev_uuid(&identity.id)), err)]
    pub async fn create(&self, identity: &Identity, request: &CarRequest) -> Result<CarDBResponse> {
        let car = validate_car(&request.title, &request.description, &request.tags, &request.images)?;

        let created = self
            .store
            .create(&CarCreateDBRequest {
                owner_id: identity.id,
                title: car.title,
                description: car.description,
                tags: car.tags,
                images: car.images,
            })
            .await?;

        Ok(created)
    }

    #[instrument(skip_all, fields(owner_id = %abbrev_uuid(&identity.id), car_id = %abbrev_uuid(&id)), err)]
    pub async fn get(&self, identity: &Identity, id: CarId) -> Result<CarDBResponse> {
        self.store.get(identity.id, id).await?.ok_or_else(|| not_found(id))
    }

    #[instrument(skip_all, fields(owner_id = %abbrev_uuid(&identity.id)), err)]
    pub async fn list(&self, identity: &Identity, options: ListOptions) -> Result<Vec<CarDBResponse>> {
        let filter = options.into_filter(identity);
        Ok(self.store.list(&filter).await?)
    }

    /// Replace every editable field. Validation runs before the store is touched.
    #[instrument(skip_all, fields(owner_id = %abbrev_uuid(&identity.id), car_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&self, identity: &Identity, id: CarId, request: &CarRequest) -> Result<CarDBResponse> {
        let car = validate_car(&request.title, &request.description, &request.tags, &request.images)?;

        self.store
            .update(
                identity.id,
                id,
                &CarUpdateDBRequest {
                    title: car.title,
                    description: car.description,
                    tags: car.tags,
                    images: car.images,
                },
            )
            .await?
            .ok_or_else(|| not_found(id))
    }

    #[instrument(skip_all, fields(owner_id = %abbrev_uuid(&identity.id), car_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&self, identity: &Identity, id: CarId) -> Result<()> {
        if self.store.delete(identity.id, id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}
