//! Error types for acledit

use thiserror::Error;

/// The main error type for ACL operations
#[derive(Debug, Error)]
pub enum AclError {
    /// No ACE matched the probed identities. Callers probing grant state
    /// catch this and treat it as "not granted".
    #[error("no ACE found for the given identities")]
    NoAceFound,

    #[error("no ACE at index {0}")]
    NoSuchAce(usize),

    #[error("no ACL has been loaded for this subject")]
    MissingAcl,

    #[error("no form has been built for this subject")]
    MissingForm,

    #[error("store not initialized")]
    NotInitialized,

    #[error("store already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("storage error: {0}")]
    Storage(#[from] heed::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ACL operations
pub type Result<T> = std::result::Result<T, AclError>;
