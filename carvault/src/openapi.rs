//! OpenAPI documentation for the `/api/*` endpoints.
//!
//! Served as JSON at `/api/openapi.json` and rendered at `/api/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Security schemes: the session token as a bearer header or as the session cookie.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token returned by register and login:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                            The session cookie takes precedence when both are sent.",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "jwt",
                    "Session cookie set by register and login",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers((url = "/api", description = "Car records API")),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::me,
        api::handlers::cars::list_cars,
        api::handlers::cars::search_cars,
        api::handlers::cars::create_car,
        api::handlers::cars::get_car,
        api::handlers::cars::update_car,
        api::handlers::cars::delete_car,
        api::handlers::health::health,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::LogoutBody,
            api::models::users::UserResponse,
            api::models::users::UserData,
            api::models::users::CurrentUserResponse,
            api::models::cars::CarRequest,
            api::models::cars::CarResponse,
            api::models::cars::DeleteCarResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Register, log in and manage the session cookie."),
        (name = "cars", description = "Car records owned by the caller. Cars of other users are reported as not found."),
        (name = "health", description = "Liveness."),
    )
)]
pub struct ApiDoc;
