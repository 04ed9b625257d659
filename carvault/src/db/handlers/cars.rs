//! Car storage. Every operation is scoped to an owner.

use crate::db::{
    errors::Result,
    models::cars::{CarCreateDBRequest, CarDBResponse, CarFilter, CarUpdateDBRequest},
};
use crate::types::{abbrev_uuid, CarId, UserId};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const CAR_COLUMNS: &str = "id, owner_id, title, description, tags, images, created_at, updated_at";

/// Text searched by free-text queries.
const SEARCH_DOCUMENT: &str = "to_tsvector('english', title || ' ' || description || ' ' || array_to_string(tags, ' '))";

#[async_trait]
pub trait CarStore: Send + Sync {
    async fn create(&self, request: &CarCreateDBRequest) -> Result<CarDBResponse>;

    /// `None` when the car does not exist or belongs to another owner.
    async fn get(&self, owner_id: UserId, id: CarId) -> Result<Option<CarDBResponse>>;

    /// Cars of `filter.owner_id`.
    ///
    /// With search terms, only cars matching at least one term are returned, most relevant first
    /// (ties newest first). Otherwise the requested sort applies.
    async fn list(&self, filter: &CarFilter) -> Result<Vec<CarDBResponse>>;

    /// Replace editable fields. `None` when the car does not exist or belongs to another owner.
    async fn update(&self, owner_id: UserId, id: CarId, request: &CarUpdateDBRequest) -> Result<Option<CarDBResponse>>;

    /// `false` when the car does not exist or belongs to another owner.
    async fn delete(&self, owner_id: UserId, id: CarId) -> Result<bool>;
}

/// PostgreSQL-backed car store
#[derive(Debug, Clone)]
pub struct Cars {
    pool: PgPool,
}

impl Cars {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `to_tsquery` input matching any of the terms. Terms are alphanumeric, so no escaping is needed.
fn any_term_query(terms: &[String]) -> String {
    terms.join(" | ")
}

#[async_trait]
impl CarStore for Cars {
    #[instrument(skip(self, request), fields(owner_id = %abbrev_uuid(&request.owner_id)), err)]
    async fn create(&self, request: &CarCreateDBRequest) -> Result<CarDBResponse> {
        let car = sqlx::query_as::<_, CarDBResponse>(&format!(
            "INSERT INTO cars (id, owner_id, title, description, tags, images) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CAR_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.owner_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.tags)
        .bind(&request.images)
        .fetch_one(&self.pool)
        .await?;

        Ok(car)
    }

    #[instrument(skip(self), fields(owner_id = %abbrev_uuid(&owner_id), car_id = %abbrev_uuid(&id)), err)]
    async fn get(&self, owner_id: UserId, id: CarId) -> Result<Option<CarDBResponse>> {
        let car = sqlx::query_as::<_, CarDBResponse>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1 AND owner_id = $2"))
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    #[instrument(skip(self, filter), fields(owner_id = %abbrev_uuid(&filter.owner_id), tags = filter.tags.len()), err)]
    async fn list(&self, filter: &CarFilter) -> Result<Vec<CarDBResponse>> {
        let terms = filter.search_terms();

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {CAR_COLUMNS} FROM cars WHERE owner_id = "));
        query.push_bind(filter.owner_id);

        if !filter.tags.is_empty() {
            query.push(" AND tags @> ");
            query.push_bind(filter.tags.clone());
        }

        if terms.is_empty() {
            // Column and direction come from closed enums
            query.push(format!(
                " ORDER BY {column} {order}, id {order}",
                column = filter.sort.column(),
                order = filter.order.keyword()
            ));
        } else {
            let tsquery = any_term_query(&terms);
            query.push(format!(" AND {SEARCH_DOCUMENT} @@ to_tsquery('english', "));
            query.push_bind(tsquery.clone());
            query.push(format!(") ORDER BY ts_rank({SEARCH_DOCUMENT}, to_tsquery('english', "));
            query.push_bind(tsquery);
            query.push(")) DESC, created_at DESC, id DESC");
        }

        let cars = query.build_query_as::<CarDBResponse>().fetch_all(&self.pool).await?;
        Ok(cars)
    }

    #[instrument(skip(self, request), fields(owner_id = %abbrev_uuid(&owner_id), car_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, owner_id: UserId, id: CarId, request: &CarUpdateDBRequest) -> Result<Option<CarDBResponse>> {
        let car = sqlx::query_as::<_, CarDBResponse>(&format!(
            "UPDATE cars SET title = $1, description = $2, tags = $3, images = $4, updated_at = NOW() \
             WHERE id = $5 AND owner_id = $6 RETURNING {CAR_COLUMNS}"
        ))
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.tags)
        .bind(&request.images)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(car)
    }

    #[instrument(skip(self), fields(owner_id = %abbrev_uuid(&owner_id), car_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, owner_id: UserId, id: CarId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}


#[cfg(all(test, feature = "postgres-tests"))]
mod postgres_tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::handlers::{UserStore, Users};
    use crate::db::models::{
        cars::{SortField, SortOrder},
        users::UserCreateDBRequest,
    };

    async fn owner(pool: &PgPool, email: &str) -> UserId {
        Users::new(pool.clone())
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                name: "Owner".to_string(),
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn request(owner_id: UserId, title: &str, description: &str, tags: &[&str]) -> CarCreateDBRequest {
        CarCreateDBRequest {
            owner_id,
            title: title.to_string(),
            description: description.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            images: vec!["https://img.example.com/car.jpg".to_string()],
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_owner_scoping(pool: PgPool) {
        let cars = Cars::new(pool.clone());
        let alice = owner(&pool, "alice@example.com").await;
        let bob = owner(&pool, "bob@example.com").await;

        let car = cars.create(&request(alice, "Golf GTI", "Hot hatch with a manual box", &["hatch"])).await.unwrap();

        assert!(cars.get(bob, car.id).await.unwrap().is_none());
        assert!(!cars.delete(bob, car.id).await.unwrap());
        assert_eq!(cars.get(alice, car.id).await.unwrap(), Some(car.clone()));
        assert!(cars.delete(alice, car.id).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_tags_must_all_match(pool: PgPool) {
        let cars = Cars::new(pool.clone());
        let alice = owner(&pool, "alice@example.com").await;

        cars.create(&request(alice, "Model S", "Large electric saloon car", &["electric", "luxury"]))
            .await
            .unwrap();
        cars.create(&request(alice, "Leaf", "Small electric commuter car", &["electric"])).await.unwrap();

        let mut filter = CarFilter::new(alice);
        filter.tags = vec!["electric".to_string(), "luxury".to_string()];
        let found = cars.list(&filter).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Model S");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_search_and_sort(pool: PgPool) {
        let cars = Cars::new(pool.clone());
        let alice = owner(&pool, "alice@example.com").await;

        cars.create(&request(alice, "Tesla Model 3", "Tesla's compact electric sedan", &["electric"]))
            .await
            .unwrap();
        cars.create(&request(alice, "Ford Mustang", "Classic american muscle car", &["classic"]))
            .await
            .unwrap();

        let mut filter = CarFilter::new(alice);
        filter.search = Some("tesla".to_string());
        let found = cars.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Tesla Model 3");

        let mut filter = CarFilter::new(alice);
        filter.sort = SortField::Title;
        filter.order = SortOrder::Asc;
        let titles: Vec<_> = cars.list(&filter).await.unwrap().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["Ford Mustang", "Tesla Model 3"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
        owner(&pool, "alice@example.com").await;
        let err = Users::new(pool)
            .create(&UserCreateDBRequest {
                email: "alice@example.com".to_string(),
                name: "Again".to_string(),
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
