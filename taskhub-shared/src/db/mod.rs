/// Database layer for TaskHub
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded schema migrations
/// - `postgres`: `PgStore`, the production implementation of the store traits
///
/// Row-level SQL lives next to each model in `crate::models`.

pub mod migrations;
pub mod pool;
pub mod postgres;

pub use postgres::PgStore;
