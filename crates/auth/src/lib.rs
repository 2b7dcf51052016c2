//! `storefront-auth`: operator authentication boundary.
//!
//! This crate is decoupled from HTTP and storage; the API decides which
//! routes need an operator and passes the presented credential here.

pub mod admin;

pub use admin::{authorize_admin, AdminToken, AuthError};
