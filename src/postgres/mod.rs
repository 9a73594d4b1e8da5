// ABOUTME: PostgreSQL dialect support
// ABOUTME: Exports connection management and information_schema-based DDL reconstruction

pub mod connection;
pub mod schema;

pub use connection::{connect, PostgresSession};
pub use schema::{build_create_table, ColumnInfo};
