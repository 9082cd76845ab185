//! Request handlers

mod auth;
mod demo;
mod frontend;
mod health;
mod vortex;

pub use auth::*;
pub use demo::*;
pub use frontend::*;
pub use health::*;
pub use vortex::*;
