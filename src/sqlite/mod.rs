// SQLite module - the bundled driver behind `Database`
//
// - config: open options and their fluent builder
// - connection: the shared connection handle and blocking execution helper
// - params: conversion from `FieldValue` to rusqlite values
// - query: row extraction into `Rows`

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use params::{NamedParams, Params};
pub use query::build_rows;
