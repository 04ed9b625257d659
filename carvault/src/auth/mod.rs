//! Session authentication.
//!
//! Callers authenticate with a signed JWT obtained from `/api/auth/register` or
//! `/api/auth/login`. The token is presented either as the session cookie (set automatically by
//! those endpoints) or as an `Authorization: Bearer <token>` header. When both are present the
//! cookie wins, unless it holds the logged-out sentinel written by `/api/auth/logout`.
//!
//! # Modules
//!
//! - [`session`]: Token issuance and verification ([`session::TokenService`])
//! - [`credentials`]: Locating the presented token in request headers
//! - [`current_user`]: The [`current_user::Identity`] and [`current_user::AuthContext`] extractors
//! - [`password`]: Password hashing and verification using Argon2
//!
//! # Usage in Handlers
//!
//! ```ignore
//! async fn handler(identity: Identity) -> Result<Json<Identity>, Error> {
//!     Ok(Json(identity))
//! }
//! ```

pub mod credentials;
pub mod current_user;
pub mod password;
pub mod session;
