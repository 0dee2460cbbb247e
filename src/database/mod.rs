//! Connection pool and migration helpers.

mod pool;

pub use pool::{create_lazy_pool, create_pool, ping, run_migrations, Database, DatabaseError};
