//! Backend for scanning and cataloging infrared device-control files (`.ir`)
//! on removable media.
//!
//! The scanner walks the device hierarchy through the [`storage::Storage`]
//! trait, classifies every control file via its comment header or the name
//! guesser, and persists the result to SQLite. An Axum HTTP surface exposes
//! scan lifecycle, grouped views, a shared catalog and the metadata
//! confirmation workflow.

pub mod config;
pub mod db;
pub mod error;
pub mod group;
pub mod metadata;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod scanner;
pub mod state;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;
