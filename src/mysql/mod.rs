// ABOUTME: MySQL dialect support
// ABOUTME: Exports the connection session and SHOW-based introspection helpers

pub mod connection;
pub mod schema;

pub use connection::{connect, MySqlSession};
pub use schema::quote_identifier;
