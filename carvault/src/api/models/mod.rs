//! Request and response types for the HTTP API.

pub mod auth;
pub mod cars;
pub mod users;
