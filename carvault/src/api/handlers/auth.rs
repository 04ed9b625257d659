use axum::{extract::State, Json};
use tracing::info;

use crate::{
    api::{
        extract::AppJson,
        models::{
            auth::{AuthResponse, LoginRequest, LoginResponse, LogoutBody, LogoutResponse, RegisterRequest, RegisterResponse},
            users::{CurrentUserResponse, UserResponse},
        },
    },
    auth::{
        current_user::Identity,
        password::{self, Argon2Params},
    },
    config::{Config, SessionConfig},
    db::models::users::UserCreateDBRequest,
    errors::Error,
    types::abbrev_uuid,
    validation::{normalize_email, validate_registration},
    AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered and session started", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, AppJson(request): AppJson<RegisterRequest>) -> Result<RegisterResponse, Error> {
    let registration = validate_registration(&request.email, &request.password, &request.name, &state.config.auth.password)?;

    // The unique constraint still catches concurrent registrations
    if state.users.get_by_email(&registration.email).await?.is_some() {
        return Err(Error::DuplicateKey {
            message: "Email already exists".to_string(),
        });
    }

    let password_hash = password::hash_password_blocking(registration.password, Argon2Params::from(&state.config.auth.password)).await?;

    let user = state
        .users
        .create(&UserCreateDBRequest {
            email: registration.email,
            name: registration.name,
            password_hash,
        })
        .await?;
    info!(user_id = %abbrev_uuid(&user.id), "Registered user");

    let token = state.tokens.issue(user.id)?;
    let cookie = session_cookie(&token, &state.config);

    Ok(RegisterResponse {
        auth_response: AuthResponse::new(UserResponse::from(user), token),
        cookie,
    })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, AppJson(request): AppJson<LoginRequest>) -> Result<LoginResponse, Error> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(Error::Validation {
            message: "Please provide email and password".to_string(),
        });
    }

    // Unknown email and wrong password are indistinguishable to the caller
    let invalid = || Error::Unauthenticated {
        message: Some(INVALID_CREDENTIALS.to_string()),
    };

    let user = state.users.get_by_email(&normalize_email(&request.email)).await?;

    // An unknown email still pays for one Argon2 verification
    let hash = match &user {
        Some(user) => user.password_hash.clone(),
        None => state.decoy_hash.to_string(),
    };
    let verified = password::verify_password_blocking(request.password, hash).await?;

    let user = match user {
        Some(user) if verified => user,
        _ => return Err(invalid()),
    };

    let token = state.tokens.issue(user.id)?;
    let cookie = session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse::new(UserResponse::from(user), token),
        cookie,
    })
}

/// Logout (replace the session cookie with the logged-out sentinel)
///
/// Never requires a valid session. Clients holding the token elsewhere (e.g. in an
/// `Authorization` header) can keep using it until it expires.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = LogoutBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    let session = &state.config.auth.session;
    let cookie = cookie_string(session, &session.logged_out_value, session.logout_grace.as_secs());

    LogoutResponse { cookie }
}

/// Get the currently authenticated user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(identity: Identity) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse::new(UserResponse::from(identity)))
}

/// Build the `Set-Cookie` value carrying a fresh session token.
fn session_cookie(token: &str, config: &Config) -> String {
    cookie_string(&config.auth.session, token, config.auth.security.jwt_expiry.as_secs())
}

fn cookie_string(session: &SessionConfig, value: &str, max_age: u64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        session.cookie_name,
        value,
        same_site_attribute(&session.cookie_same_site),
        max_age
    );
    if session.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn same_site_attribute(value: &str) -> &'static str {
    match value.to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_config, create_test_state};
    use axum::{
        http::{header, StatusCode},
        routing::{get, post},
        Router,
    };
    use axum_test::TestServer;
    use serde_json::json;
    use std::sync::Arc;

    fn auth_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout).get(logout))
            .route("/auth/me", get(me))
            .with_state(state);

        TestServer::new(app).unwrap()
    }

    fn set_cookie(response: &axum_test::TestResponse) -> String {
        response.header(header::SET_COOKIE).to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_success() {
        let server = auth_server(create_test_state(create_test_config()));

        let response = server
            .post("/auth/register")
            .json(&json!({"email": "Driver@Example.com", "password": "secret123", "name": "Driver"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("jwt="));
        assert!(cookie.contains("HttpOnly"));

        let body: AuthResponse = response.json();
        assert_eq!(body.status, "success");
        assert_eq!(body.data.user.email, "driver@example.com");
        assert_eq!(body.data.user.name, "Driver");
        assert!(!body.token.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let server = auth_server(create_test_state(create_test_config()));
        let payload = json!({"email": "driver@example.com", "password": "secret123", "name": "Driver"});

        server.post("/auth/register").json(&payload).await.assert_status(StatusCode::CREATED);

        let response = server
            .post("/auth/register")
            .json(&json!({"email": "DRIVER@example.com", "password": "other-secret", "name": "Other"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"status": "fail", "message": "Email already exists"}));
    }

    #[tokio::test]
    async fn test_register_password_too_short() {
        let mut config = create_test_config();
        config.auth.password.min_length = 10;
        let server = auth_server(create_test_state(config));

        let response = server
            .post("/auth/register")
            .json(&json!({"email": "driver@example.com", "password": "short", "name": "Driver"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("at least 10 characters"));
    }

    #[tokio::test]
    async fn test_login_success_and_failures() {
        let server = auth_server(create_test_state(create_test_config()));
        server
            .post("/auth/register")
            .json(&json!({"email": "driver@example.com", "password": "secret123", "name": "Driver"}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/auth/login")
            .json(&json!({"email": " Driver@example.com ", "password": "secret123"}))
            .await;
        response.assert_status_ok();
        let body: AuthResponse = response.json();
        assert_eq!(body.data.user.email, "driver@example.com");

        let wrong_password = server
            .post("/auth/login")
            .json(&json!({"email": "driver@example.com", "password": "wrong-password"}))
            .await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);

        let unknown_email = server
            .post("/auth/login")
            .json(&json!({"email": "nobody@example.com", "password": "secret123"}))
            .await;
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);

        // Same body either way
        assert_eq!(wrong_password.json::<serde_json::Value>(), unknown_email.json::<serde_json::Value>());
    }

    #[tokio::test]
    async fn test_unknown_email_is_verified_against_decoy() {
        let mut state = create_test_state(create_test_config());
        assert!(state.decoy_hash.starts_with("$argon2id$"));

        // A decoy the verifier cannot parse turns the unknown-email path into an internal error,
        // which only happens if that path reaches the verifier
        state.decoy_hash = Arc::from("not-a-phc-string");
        let server = auth_server(state);
        server
            .post("/auth/register")
            .json(&json!({"email": "driver@example.com", "password": "secret123", "name": "Driver"}))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/auth/login")
            .json(&json!({"email": "nobody@example.com", "password": "secret123"}))
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        // Known users are verified against their own hash
        server
            .post("/auth/login")
            .json(&json!({"email": "driver@example.com", "password": "wrong-password"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/auth/login")
            .json(&json!({"email": "driver@example.com", "password": "secret123"}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let server = auth_server(create_test_state(create_test_config()));

        let response = server.post("/auth/login").json(&json!({"email": "driver@example.com"})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"status": "fail", "message": "Please provide email and password"}));
    }

    #[tokio::test]
    async fn test_logout_sets_sentinel_cookie() {
        let server = auth_server(create_test_state(create_test_config()));

        for response in [server.post("/auth/logout").await, server.get("/auth/logout").await] {
            response.assert_status_ok();
            response.assert_json(&json!({"status": "success"}));
            let cookie = set_cookie(&response);
            assert!(cookie.starts_with("jwt=loggedout;"));
            assert!(cookie.contains("Max-Age=10"));
        }
    }

    #[tokio::test]
    async fn test_me_requires_session() {
        let server = auth_server(create_test_state(create_test_config()));

        let response = server.get("/auth/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({"status": "fail", "message": "Please log in to access this resource"}));
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = create_test_config();
        config.auth.session.cookie_same_site = "strict".to_string();
        config.auth.session.cookie_secure = true;

        let cookie = session_cookie("abc", &config);
        assert_eq!(
            cookie,
            format!(
                "jwt=abc; Path=/; HttpOnly; SameSite=Strict; Max-Age={}; Secure",
                config.auth.security.jwt_expiry.as_secs()
            )
        );

        config.auth.session.cookie_secure = false;
        assert!(!session_cookie("abc", &config).contains("Secure"));
    }
}
