use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::{
        extract::{AppJson, AppPath, AppQuery},
        models::cars::{CarRequest, CarResponse, DeleteCarResponse, ListCarsQuery, SearchCarsQuery},
    },
    auth::current_user::Identity,
    errors::Error,
    types::CarId,
    AppState,
};

/// List the caller's cars
#[utoipa::path(
    get,
    path = "/cars",
    tag = "cars",
    params(ListCarsQuery),
    responses(
        (status = 200, description = "The caller's cars", body = [CarResponse]),
        (status = 400, description = "Unknown sort field or order"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_cars(
    State(state): State<AppState>,
    identity: Identity,
    AppQuery(query): AppQuery<ListCarsQuery>,
) -> Result<Json<Vec<CarResponse>>, Error> {
    let cars = state.cars.list(&identity, query.into()).await?;
    Ok(Json(cars.into_iter().map(CarResponse::from).collect()))
}

/// Search the caller's cars by free text
///
/// Matches any term of `q` against title, description and tags, most relevant first. A blank
/// `q` returns the default listing.
#[utoipa::path(
    get,
    path = "/cars/search",
    tag = "cars",
    params(SearchCarsQuery),
    responses(
        (status = 200, description = "Matching cars", body = [CarResponse]),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn search_cars(
    State(state): State<AppState>,
    identity: Identity,
    AppQuery(query): AppQuery<SearchCarsQuery>,
) -> Result<Json<Vec<CarResponse>>, Error> {
    let cars = state.cars.list(&identity, query.into()).await?;
    Ok(Json(cars.into_iter().map(CarResponse::from).collect()))
}

/// Create a car owned by the caller
#[utoipa::path(
    post,
    path = "/cars",
    tag = "cars",
    request_body = CarRequest,
    responses(
        (status = 201, description = "Car created", body = CarResponse),
        (status = 400, description = "Invalid input data"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_car(
    State(state): State<AppState>,
    identity: Identity,
    AppJson(request): AppJson<CarRequest>,
) -> Result<(StatusCode, Json<CarResponse>), Error> {
    let car = state.cars.create(&identity, &request).await?;
    Ok((StatusCode::CREATED, Json(CarResponse::from(car))))
}

/// Get one of the caller's cars
#[utoipa::path(
    get,
    path = "/cars/{id}",
    tag = "cars",
    params(("id" = String, Path, description = "Car ID")),
    responses(
        (status = 200, description = "The car", body = CarResponse),
        (status = 400, description = "Malformed car ID"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such car owned by the caller"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_car(State(state): State<AppState>, identity: Identity, AppPath(id): AppPath<CarId>) -> Result<Json<CarResponse>, Error> {
    let car = state.cars.get(&identity, id).await?;
    Ok(Json(CarResponse::from(car)))
}

/// Replace the editable fields of one of the caller's cars
///
/// Served for both PUT and PATCH. The payload is validated as a whole, exactly like a create.
#[utoipa::path(
    put,
    path = "/cars/{id}",
    tag = "cars",
    request_body = CarRequest,
    params(("id" = String, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Updated car", body = CarResponse),
        (status = 400, description = "Invalid input data or malformed car ID"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such car owned by the caller"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_car(
    State(state): State<AppState>,
    identity: Identity,
    AppPath(id): AppPath<CarId>,
    AppJson(request): AppJson<CarRequest>,
) -> Result<Json<CarResponse>, Error> {
    let car = state.cars.update(&identity, id, &request).await?;
    Ok(Json(CarResponse::from(car)))
}

/// Delete one of the caller's cars
#[utoipa::path(
    delete,
    path = "/cars/{id}",
    tag = "cars",
    params(("id" = String, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Car deleted", body = DeleteCarResponse),
        (status = 400, description = "Malformed car ID"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such car owned by the caller"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_car(
    State(state): State<AppState>,
    identity: Identity,
    AppPath(id): AppPath<CarId>,
) -> Result<Json<DeleteCarResponse>, Error> {
    state.cars.delete(&identity, id).await?;
    Ok(Json(DeleteCarResponse {
        message: "Car deleted successfully".to_string(),
    }))
}
