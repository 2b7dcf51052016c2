//! HTTP API: routing, admin authorization and request/response mapping.

pub mod app;
pub mod authz;
pub mod middleware;
