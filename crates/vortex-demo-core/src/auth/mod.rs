//! Authentication module for session tokens and credentials.
//!
//! This module provides:
//! - `TokenAuthority`: issues and verifies stateless HMAC-signed session tokens
//! - `CredentialStore`: the in-memory demo user table
//! - `PasswordHash`: stored password digests (legacy SHA-256 or Argon2id)
//!
//! Tokens expire 24 hours after issuance and are never stored server-side.

pub mod credentials;
mod encoding;
pub mod password;
pub mod token;

pub use credentials::{CredentialStore, UserRecord, DEMO_LOGINS};
pub use password::{PasswordError, PasswordHash};
pub use token::{TokenAuthority, TokenError};
