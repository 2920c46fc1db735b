//! HTTP route handlers for the IR catalog API.
//!
//! - `catalog`: the shared file catalog (upload, prefix search, download)
//! - `files`: direct device-file operations (metadata confirmation)
//! - `health`: health check and system status endpoints
//! - `scans`: scan lifecycle, results and grouped views

pub mod catalog;
pub mod files;
pub mod health;
pub mod scans;
