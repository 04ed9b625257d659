//! Identity resolution: credential extraction, token verification and user lookup.
//!
//! [`AuthContext`] and [`Identity`] are axum extractors. Adding either to a handler's arguments
//! makes the route require a valid session; every failure surfaces as
//! [`Error::Unauthenticated`] with the same message, whatever the cause.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::{
    auth::{credentials, session::TokenService},
    config::SessionConfig,
    db::{handlers::UserStore, models::users::UserDBResponse},
    errors::{Error, Result},
    types::{abbrev_uuid, UserId},
    AppState,
};

/// The authenticated caller for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Identity {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl From<UserDBResponse> for Identity {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Per-request authentication context.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,
    /// The token the identity was resolved from
    pub token: String,
}

/// Turns request credentials into an [`AuthContext`].
pub struct IdentityResolver<'a> {
    tokens: &'a TokenService,
    users: &'a dyn UserStore,
    session: &'a SessionConfig,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(tokens: &'a TokenService, users: &'a dyn UserStore, session: &'a SessionConfig) -> Self {
        Self { tokens, users, session }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&state.tokens, state.users.as_ref(), &state.config.auth.session)
    }

    #[instrument(skip_all, err(level = "debug"))]
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let token = credentials::extract(headers, self.session).ok_or_else(|| {
            debug!("No session credential presented");
            unauthenticated()
        })?;

        let claims = self.tokens.verify(&token).map_err(|e| {
            debug!("Session token rejected: {e}");
            unauthenticated()
        })?;

        let user = self.users.get_by_id(claims.sub).await?.ok_or_else(|| {
            debug!(user_id = %abbrev_uuid(&claims.sub), "Session subject no longer exists");
            unauthenticated()
        })?;

        Ok(AuthContext {
            identity: Identity::from(user),
            token,
        })
    }
}

fn unauthenticated() -> Error {
    Error::Unauthenticated { message: None }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(context) = parts.extensions.get::<AuthContext>() {
            return Ok(context.clone());
        }

        let context = IdentityResolver::from_state(state).resolve(&parts.headers).await?;
        parts.extensions.insert(context.clone());
        Ok(context)
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        Ok(AuthContext::from_request_parts(parts, state).await?.identity)
    }
}
