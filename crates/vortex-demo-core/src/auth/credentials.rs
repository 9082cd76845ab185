use tracing::debug;

use super::password::PasswordHash;
use crate::models::{GroupMembership, Identity};

/// A stored user: identity fields plus the password digest.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub role: String,
    pub groups: Vec<GroupMembership>,
}

impl UserRecord {
    /// The identity this record authenticates as
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            groups: self.groups.clone(),
        }
    }
}

/// Email and password of each demo account, for login hints.
pub const DEMO_LOGINS: [(&str, &str); 2] = [
    ("admin@example.com", "password123"),
    ("user@example.com", "userpass"),
];

/// Read-only user table keyed by email.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: Vec<UserRecord>,
}

impl CredentialStore {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    /// The two fixed demo accounts.
    ///
    /// Digests use the legacy SHA-256 scheme so they match credentials
    /// handed out with earlier versions of the demo.
    pub fn demo() -> Self {
        Self::new(vec![
            UserRecord {
                id: "user-1".to_string(),
                email: DEMO_LOGINS[0].0.to_string(),
                password_hash: PasswordHash::sha256(DEMO_LOGINS[0].1),
                role: "admin".to_string(),
                groups: vec![
                    GroupMembership::new("team", "team-1", "Engineering"),
                    GroupMembership::new("organization", "org-1", "Acme Corp"),
                ],
            },
            UserRecord {
                id: "user-2".to_string(),
                email: DEMO_LOGINS[1].0.to_string(),
                password_hash: PasswordHash::sha256(DEMO_LOGINS[1].1),
                role: "user".to_string(),
                groups: vec![GroupMembership::new("team", "team-1", "Engineering")],
            },
        ])
    }

    /// Find a user by exact email match
    pub fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.email == email)
    }

    /// Check an email/password pair and return the matching identity
    pub fn authenticate(&self, email: &str, password: &str) -> Option<Identity> {
        let Some(user) = self.find_by_email(email) else {
            debug!("Login attempt for unknown email");
            return None;
        };
        if !user.password_hash.verify(password) {
            debug!(user_id = %user.id, "Password mismatch");
            return None;
        }
        Some(user.identity())
    }

    /// All users as identities, in table order
    pub fn identities(&self) -> Vec<Identity> {
        self.users.iter().map(UserRecord::identity).collect()
    }
}
