//! Storage records and request types.

pub mod cars;
pub mod users;
