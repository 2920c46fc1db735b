//! Middleware components for HTTP request processing.
//!
//! Cross-cutting concerns layered onto the Axum router: rate limiting,
//! request validation, security headers and client identification.

pub mod ip;
pub mod rate_limit;
pub mod security_headers;
pub mod validation;

pub use rate_limit::EndpointRateLimiter;
