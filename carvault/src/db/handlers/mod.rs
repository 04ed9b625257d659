//! Store traits and their PostgreSQL implementations.
//!
//! Handlers never talk to a database directly; they hold an `Arc<dyn UserStore>` and an
//! `Arc<dyn CarStore>`. Two implementations exist:
//!
//! - [`Users`] / [`Cars`]: PostgreSQL over a shared [`sqlx::PgPool`]
//! - [`crate::db::in_memory::InMemoryStore`]: process-local maps for development and tests
//!
//! Every car operation takes the owner id and folds it into the query predicate, so a car
//! belonging to someone else is indistinguishable from a missing one.

pub mod cars;
pub mod users;

pub use cars::{CarStore, Cars};
pub use users::{UserStore, Users};
