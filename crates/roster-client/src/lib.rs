//! REST client for the Roster employee directory service.
//!
//! Provides the `EmployeeApi` trait, the reqwest-backed `HttpEmployeeClient`,
//! and `ClientConfig` for locating the service.

mod api;
mod config;
mod http;

pub use api::*;
pub use config::*;
pub use http::*;
