pub mod connection;

pub use connection::{DbPool, create_pool, run_migrations};

#[cfg(test)]
pub(crate) use connection::{count_row, statement_log};
