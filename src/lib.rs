//! acledit - Object-level ACL editing with bitmask permissions
//!
//! Binds a checkbox-per-permission edit form to per-object access control
//! lists. One [`AclSubject`] is created per edit request; the
//! [`AclManipulator`] builds the form from current grant state and applies
//! the submission back, upserting one ACE per candidate identity. Owner-only
//! permissions (MASTER, OWNER) are preserved for editors without OWNER.
//!
//! Storage is LMDB behind a process-wide environment: call [`init`] once
//! before using the store-backed [`AclSecurityHandler`].

pub mod acl;
pub mod error;
pub mod form;
pub mod handler;
pub mod identity;
pub mod manipulator;
pub mod perms;
pub mod store;
pub mod subject;

pub use acl::{AccessControlEntry, Acl, ObjectIdentity};
pub use error::{AclError, Result};
pub use form::{AclForm, CheckboxField};
pub use handler::{Admin, AdminContext, AclSecurityHandler, SecurityHandler, SecurityInformation};
pub use identity::{AclCandidate, SecurityIdentity, UserAccount};
pub use manipulator::AclManipulator;
pub use perms::{MaskBuilder, Permission, ALL_PERMISSIONS, OWNER_PERMISSIONS};
pub use store::{clear_all, init, test_lock};
pub use subject::AclSubject;
