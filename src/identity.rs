//! Security identities and the candidates an ACL editor configures
//!
//! Candidates are what the caller hands us (authenticated accounts or role
//! names); security identities are the keys the ACL stores. Identities
//! render as `type:id` strings (`user:alice`, `role:ROLE_ADMIN`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// An authenticated user account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
}

impl UserAccount {
    pub fn new(username: impl Into<String>) -> Self {
        UserAccount { username: username.into() }
    }
}

/// A user or role whose grants are being edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AclCandidate {
    User(UserAccount),
    Role(String),
}

impl AclCandidate {
    pub fn user(username: impl Into<String>) -> Self {
        AclCandidate::User(UserAccount::new(username))
    }

    pub fn role(name: impl Into<String>) -> Self {
        AclCandidate::Role(name.into())
    }

    /// Resolve the ACL key for this candidate: an authenticated-user type
    /// yields a user identity derived from the account, anything else is a
    /// role identity.
    pub fn security_identity(&self) -> SecurityIdentity {
        match self {
            AclCandidate::User(account) => SecurityIdentity::from_account(account),
            AclCandidate::Role(name) => SecurityIdentity::Role(name.clone()),
        }
    }

    /// Label used in form field keys; spaces become underscores
    pub fn field_label(&self) -> String {
        self.to_string().replace(' ', "_")
    }
}

impl fmt::Display for AclCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclCandidate::User(account) => f.write_str(&account.username),
            AclCandidate::Role(name) => f.write_str(name),
        }
    }
}

/// Opaque ACL key for a user account or a role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityIdentity {
    User(String),
    Role(String),
}

impl SecurityIdentity {
    /// Derive a user identity from an account
    pub fn from_account(account: &UserAccount) -> Self {
        SecurityIdentity::User(account.username.clone())
    }

    /// Parse the `type:id` rendering back into an identity
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, id) = s.split_once(':')?;
        match kind {
            "user" => Some(SecurityIdentity::User(id.to_string())),
            "role" => Some(SecurityIdentity::Role(id.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for SecurityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityIdentity::User(name) => write!(f, "user:{}", name),
            SecurityIdentity::Role(name) => write!(f, "role:{}", name),
        }
    }
}
