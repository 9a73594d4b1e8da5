// ABOUTME: Library module for table-ddl-exporter
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod interactive;
pub mod mysql;
pub mod postgres;
pub mod utils;
pub mod writer;
