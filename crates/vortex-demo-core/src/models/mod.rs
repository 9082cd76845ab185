//! Data models shared between the core library and the HTTP layer.
//!
//! - `Identity`, `GroupMembership`: the authenticated principal carried in session tokens
//! - `Invitation`, `InvitationTarget`: Vortex invitation resources

pub mod identity;
pub mod invitation;

pub use identity::{GroupMembership, Identity};
pub use invitation::{Invitation, InvitationTarget, InvitationsResponse};
