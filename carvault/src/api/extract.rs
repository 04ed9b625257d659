//! Extractors whose rejections are routed through [`Error`].
//!
//! axum's stock `Json`, `Path` and `Query` reject with plain-text bodies; these wrappers convert
//! the rejection so it reaches the client in the same JSON shape as every other fault.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::Error;

/// JSON request body. A missing or undecodable body is a validation fault.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct AppJson<T>(pub T);

/// Path parameters. An unparseable identifier is a malformed-identifier fault.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct AppPath<T>(pub T);

/// Query string. An unknown `sort` or `order` value is a validation fault.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct AppQuery<T>(pub T);
