pub mod backend;
pub mod queries;
pub mod schema;

pub use backend::DuckDbStore;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `tinytrack_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
