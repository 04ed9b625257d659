//! # carvault: car records behind session authentication
//!
//! `carvault` is a REST service where registered users keep a private collection of car records
//! (title, description, tags and image URLs). Every car belongs to the user who created it and is
//! invisible to everybody else.
//!
//! ## Request Flow
//!
//! Requests to `/api/cars/*` and `/api/auth/me` carry a session token, either in the session
//! cookie set by login or in an `Authorization: Bearer` header. The [`auth::current_user`]
//! extractors verify the token, load the user and hand the handler an [`auth::current_user::Identity`].
//! Handlers go through [`cars::CarRepository`], which validates payloads and scopes every lookup
//! to that identity, so a car owned by somebody else is indistinguishable from a missing one.
//!
//! Failures of any layer are [`errors::Error`] values. They are classified into a closed set of
//! fault kinds and rendered by the [`errors::normalize_faults`] middleware, with full diagnostics
//! in development and a redacted body in production.
//!
//! ## Storage
//!
//! Users and cars live either in PostgreSQL (`database.type: external`, or `DATABASE_URL`) or in
//! a process-local store (`database.type: memory`, the default). Both sit behind the same
//! [`db::handlers::UserStore`] and [`db::handlers::CarStore`] traits.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use carvault::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = carvault::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     carvault::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cars;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use axum::{
    extract::OriginalUri,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use bon::Builder;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;

use crate::{
    api::handlers::{auth as auth_handlers, cars as car_handlers, health},
    auth::{
        password::{self, Argon2Params},
        session::TokenService,
    },
    cars::CarRepository,
    config::{CorsOrigin, DatabaseConfig},
    db::{
        handlers::{CarStore, Cars, UserStore, Users},
        in_memory::InMemoryStore,
    },
    errors::{normalize_faults, Error},
    openapi::ApiDoc,
};

const LOGIN_DECOY_PASSWORD: &str = "carvault-login-decoy";

/// Shared state handed to every handler and extractor.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .tokens(tokens)
///     .users(users)
///     .cars(CarRepository::new(cars))
///     .decoy_hash(decoy_hash)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub tokens: TokenService,
    pub users: Arc<dyn UserStore>,
    pub cars: CarRepository,
    /// Argon2 hash verified against when a login names an unknown email, so that path costs
    /// the same as a wrong password.
    pub decoy_hash: Arc<str>,
}

impl AppState {
    /// State backed by a fresh process-local store.
    pub fn in_memory(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(InMemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }

    /// State backed by PostgreSQL. The schema must already be migrated.
    pub fn with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        Self::with_stores(config, Arc::new(Users::new(pool.clone())), Arc::new(Cars::new(pool)))
    }

    fn with_stores(config: Config, users: Arc<dyn UserStore>, cars: Arc<dyn CarStore>) -> anyhow::Result<Self> {
        let tokens = TokenService::from_config(&config)?;
        let decoy_hash = password::hash_password(LOGIN_DECOY_PASSWORD, Argon2Params::from(&config.auth.password))
            .map_err(|e| anyhow::anyhow!("build login decoy hash: {e}"))?;
        Ok(Self::builder()
            .tokens(tokens)
            .users(users)
            .cars(CarRepository::new(cars))
            .decoy_hash(Arc::from(decoy_hash))
            .config(config)
            .build())
    }
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;
    let mut origins = Vec::new();
    for origin in &cors_config.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            // Origins never carry a trailing slash, Url::as_str always adds one
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Unknown paths and unsupported methods on known paths are both reported as a missing route.
async fn route_not_found(OriginalUri(uri): OriginalUri) -> Error {
    Error::NotFound {
        resource: "Route".to_string(),
        id: uri.path().to_string(),
    }
}

/// Build the application router with all endpoints and middleware.
///
/// Every route lives under `/api`. Faults from handlers, extractors and the fallback are all
/// rendered by [`normalize_faults`].
///
/// # Errors
///
/// Returns an error if the CORS configuration cannot be turned into header values.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Authentication
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/logout", post(auth_handlers::logout).get(auth_handlers::logout))
        .route("/auth/me", get(auth_handlers::me))
        // Cars
        .route("/cars", get(car_handlers::list_cars).post(car_handlers::create_car))
        .route("/cars/search", get(car_handlers::search_cars))
        .route(
            "/cars/{id}",
            get(car_handlers::get_car)
                .put(car_handlers::update_car)
                .patch(car_handlers::update_car)
                .delete(car_handlers::delete_car),
        )
        .route("/health", get(health::health))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .method_not_allowed_fallback(route_not_found);

    let router = Router::new()
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), normalize_faults))
        .with_state(state.clone())
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()));

    let router = router.layer(create_cors_layer(&state.config)?);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// A configured server: router, state and the storage it owns.
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Set up storage and build the router.
    ///
    /// With an external database this connects and runs migrations before returning.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (state, pool) = match &config.database {
            DatabaseConfig::Memory => {
                info!("Using in-memory storage; data is lost on restart");
                (AppState::in_memory(config.clone())?, None)
            }
            DatabaseConfig::External { url, pool } => {
                info!("Connecting to external database");
                let pg = db::connect(url, pool).await?;
                (AppState::with_pool(config.clone(), pg.clone())?, Some(pg))
            }
        };

        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// The router, for driving the application without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until `shutdown` resolves, then release storage and flush telemetry.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            environment = ?self.config.environment,
            "carvault listening on http://{}, available at http://localhost:{}", bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
