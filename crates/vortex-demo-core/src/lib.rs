//! Core library for the Vortex demo server.
//!
//! - `auth`: stateless session tokens and the demo credential store
//! - `api`: client for the Vortex invitation service
//! - `models`: identity and invitation types shared with the HTTP layer
//! - `config`: secrets and endpoints injected at construction

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use config::{AuthConfig, VortexConfig};
pub use models::{GroupMembership, Identity};
