//! REST API client module for the Vortex invitation service.
//!
//! This module provides the `VortexClient` for listing, fetching,
//! accepting, revoking and re-sending invitations, plus local signing of
//! the JWTs the Vortex frontend widgets expect.
//!
//! Requests authenticate with the `x-api-key` header. Widget JWTs are
//! signed with a key derived from the same API key and never leave the
//! server unsigned.

pub mod client;
pub mod error;
pub mod jwt;

pub use client::VortexClient;
pub use error::ApiError;
pub use jwt::JwtPayload;
