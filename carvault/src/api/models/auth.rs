use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::users::{UserData, UserResponse};

/// Request to register a new user
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    /// Email address (must be unique, case-insensitive)
    pub email: String,
    /// Password (will be hashed)
    pub password: String,
    /// Display name
    pub name: String,
}

/// Request to login
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned after successful login or registration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Always `"success"`
    pub status: String,
    pub data: UserData,
    /// The session token, for clients that send `Authorization: Bearer` instead of the cookie
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: UserResponse, token: String) -> Self {
        Self {
            status: "success".to_string(),
            data: UserData { user },
            token,
        }
    }
}

/// Body returned by logout
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutBody {
    pub status: String,
}

/// Structured response for successful registration
pub struct RegisterResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, [(header::SET_COOKIE, self.cookie)], Json(self.auth_response)).into_response()
    }
}

/// Structured response for successful login
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::SET_COOKIE, self.cookie)], Json(self.auth_response)).into_response()
    }
}

/// Structured response for logout
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        let body = LogoutBody {
            status: "success".to_string(),
        };
        (StatusCode::OK, [(header::SET_COOKIE, self.cookie)], Json(body)).into_response()
    }
}
