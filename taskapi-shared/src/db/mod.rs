/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health check and connect retry
/// - `migrations`: Embedded migration runner
///
/// Models are in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
