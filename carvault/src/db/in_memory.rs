//! Process-local store used for `database.type: memory` and the test-suite.
//!
//! Mirrors the PostgreSQL stores: email uniqueness is enforced and reported as a unique
//! violation on `users_email_unique`, every car lookup is owner-scoped, and search matches any
//! term with a relevance score.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::{CarStore, UserStore},
    models::{
        cars::{CarCreateDBRequest, CarDBResponse, CarFilter, CarUpdateDBRequest, SortField, SortOrder, tokenize},
        users::{UserCreateDBRequest, UserDBResponse},
    },
};
use crate::types::{CarId, UserId};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: DashMap<UserId, UserDBResponse>,
    emails: DashMap<String, UserId>,
    cars: DashMap<CarId, CarDBResponse>,
    /// Last issued timestamp in microseconds; keeps creation order strict
    clock: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timestamp strictly later than any previously issued one.
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let previous = self
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(wall.max(last + 1)))
            .unwrap_or(wall);
        DateTime::from_timestamp_micros(wall.max(previous + 1)).unwrap_or_else(Utc::now)
    }
}

/// Number of document words matching any search term.
fn relevance(car: &CarDBResponse, terms: &[String]) -> usize {
    let document = format!("{} {} {}", car.title, car.description, car.tags.join(" "));
    tokenize(&document).iter().filter(|word| terms.contains(word)).count()
}

fn compare(a: &CarDBResponse, b: &CarDBResponse, sort: SortField, order: SortOrder) -> CmpOrdering {
    let ordering = match sort {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.cmp(&b.title),
    }
    .then_with(|| a.id.cmp(&b.id));

    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        match self.emails.entry(request.email.clone()) {
            Entry::Occupied(_) => Err(DbError::UniqueViolation {
                constraint: Some("users_email_unique".to_string()),
                table: Some("users".to_string()),
                message: format!("duplicate key value violates unique constraint (email)=({})", request.email),
            }),
            Entry::Vacant(slot) => {
                let now = self.now();
                let user = UserDBResponse {
                    id: Uuid::new_v4(),
                    email: request.email.clone(),
                    name: request.name.clone(),
                    password_hash: request.password_hash.clone(),
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.get_by_id(id).await
    }
}

#[async_trait]
impl CarStore for InMemoryStore {
    async fn create(&self, request: &CarCreateDBRequest) -> Result<CarDBResponse> {
        if !self.users.contains_key(&request.owner_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("cars_owner_id_fkey".to_string()),
                table: Some("cars".to_string()),
                message: "owner does not exist".to_string(),
            });
        }

        let now = self.now();
        let car = CarDBResponse {
            id: Uuid::new_v4(),
            owner_id: request.owner_id,
            title: request.title.clone(),
            description: request.description.clone(),
            tags: request.tags.clone(),
            images: request.images.clone(),
            created_at: now,
            updated_at: now,
        };
        self.cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn get(&self, owner_id: UserId, id: CarId) -> Result<Option<CarDBResponse>> {
        Ok(self
            .cars
            .get(&id)
            .filter(|car| car.owner_id == owner_id)
            .map(|car| car.value().clone()))
    }

    async fn list(&self, filter: &CarFilter) -> Result<Vec<CarDBResponse>> {
        let terms = filter.search_terms();

        let owned = self
            .cars
            .iter()
            .filter(|car| car.owner_id == filter.owner_id)
            .filter(|car| filter.tags.iter().all(|tag| car.tags.contains(tag)))
            .map(|car| car.value().clone());

        if terms.is_empty() {
            let mut cars: Vec<_> = owned.collect();
            cars.sort_by(|a, b| compare(a, b, filter.sort, filter.order));
            return Ok(cars);
        }

        let mut scored: Vec<(usize, CarDBResponse)> = owned
            .map(|car| (relevance(&car, &terms), car))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .cmp(score_a)
                .then_with(|| compare(a, b, SortField::CreatedAt, SortOrder::Desc))
        });

        Ok(scored.into_iter().map(|(_, car)| car).collect())
    }

    async fn update(&self, owner_id: UserId, id: CarId, request: &CarUpdateDBRequest) -> Result<Option<CarDBResponse>> {
        let Some(mut car) = self.cars.get_mut(&id).filter(|car| car.owner_id == owner_id) else {
            return Ok(None);
        };

        car.title = request.title.clone();
        car.description = request.description.clone();
        car.tags = request.tags.clone();
        car.images = request.images.clone();
        car.updated_at = self.now();

        Ok(Some(car.value().clone()))
    }

    async fn delete(&self, owner_id: UserId, id: CarId) -> Result<bool> {
        Ok(self.cars.remove_if(&id, |_, car| car.owner_id == owner_id).is_some())
    }
}
