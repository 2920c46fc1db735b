//! Integration tests for the IR catalog backend.
//!
//! - **scanner_tests**: walk order, classification, concurrency bounds
//! - **api_tests**: scan lifecycle and device-file endpoints
//! - **catalog_api_tests**: shared catalog upload, search and download
//! - **config_tests**: configuration loading and validation
//! - **db_tests**: schema setup and cascade behavior
//! - **error_tests**: error envelope mapping
//! - **health_api_tests**: health check endpoints

pub mod support;

pub mod catalog_api_tests;
pub mod db_tests;
pub mod error_tests;
