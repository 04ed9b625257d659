//! HTTP API: extractors, route handlers and request/response models.

pub mod extract;
pub mod handlers;
pub mod models;
