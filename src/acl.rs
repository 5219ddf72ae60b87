//! The ACL domain object: per-object list of identity/mask entries

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AclError, Result};
use crate::identity::SecurityIdentity;
use crate::perms::mask_to_names;

/// Identifies the domain object an ACL protects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectIdentity {
    object_type: String,
    identifier: String,
}

impl ObjectIdentity {
    pub fn new(object_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        ObjectIdentity {
            object_type: object_type.into(),
            identifier: identifier.into(),
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.identifier)
    }
}

/// One row of an ACL: an identity and its granted mask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    identity: SecurityIdentity,
    mask: u64,
}

impl AccessControlEntry {
    pub fn new(identity: SecurityIdentity, mask: u64) -> Self {
        AccessControlEntry { identity, mask }
    }

    pub fn security_identity(&self) -> &SecurityIdentity {
        &self.identity
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Names of the permissions this entry grants
    pub fn permission_names(&self) -> Vec<&'static str> {
        mask_to_names(self.mask)
    }
}

/// Access control list for one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    object_identity: ObjectIdentity,
    entries: Vec<AccessControlEntry>,
}

impl Acl {
    pub fn new(object_identity: ObjectIdentity) -> Self {
        Acl { object_identity, entries: Vec::new() }
    }

    pub(crate) fn with_entries(
        object_identity: ObjectIdentity,
        entries: Vec<AccessControlEntry>,
    ) -> Self {
        Acl { object_identity, entries }
    }

    pub fn object_identity(&self) -> &ObjectIdentity {
        &self.object_identity
    }

    /// The object-level ACEs, in insertion order
    pub fn object_aces(&self) -> &[AccessControlEntry] {
        &self.entries
    }

    /// Append a new ACE for an identity
    pub fn insert_object_ace(&mut self, identity: SecurityIdentity, mask: u64) {
        self.entries.push(AccessControlEntry::new(identity, mask));
    }

    /// Replace the mask of the ACE at `index`
    pub fn update_object_ace(&mut self, index: usize, mask: u64) -> Result<()> {
        match self.entries.get_mut(index) {
            Some(ace) => {
                ace.mask = mask;
                Ok(())
            }
            None => Err(AclError::NoSuchAce(index)),
        }
    }

    /// Probe whether any of `identities` is granted any of `masks` in full.
    ///
    /// The first ACE matching one of the identities decides. When no ACE
    /// matches at all this raises [`AclError::NoAceFound`] so callers can
    /// distinguish "no entry" from an explicit zero grant.
    pub fn is_granted(&self, masks: &[u64], identities: &[SecurityIdentity]) -> Result<bool> {
        for identity in identities {
            if let Some(ace) = self.entries.iter().find(|a| &a.identity == identity) {
                return Ok(masks.iter().any(|&m| ace.mask & m == m));
            }
        }
        Err(AclError::NoAceFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perms::Permission;

    fn oid() -> ObjectIdentity {
        ObjectIdentity::new("post", "42")
    }

    fn role(name: &str) -> SecurityIdentity {
        SecurityIdentity::Role(name.to_string())
    }

    #[test]
    fn no_ace_raises_no_ace_found() {
        let acl = Acl::new(oid());
        let err = acl
            .is_granted(&[Permission::View.mask()], &[role("ROLE_STAFF")])
            .unwrap_err();
        assert!(matches!(err, AclError::NoAceFound));
    }

    #[test]
    fn granted_when_ace_covers_mask() {
        let mut acl = Acl::new(oid());
        acl.insert_object_ace(role("ROLE_STAFF"), Permission::View.mask() | Permission::Edit.mask());
        assert!(acl
            .is_granted(&[Permission::View.mask()], &[role("ROLE_STAFF")])
            .unwrap());
        assert!(!acl
            .is_granted(&[Permission::Delete.mask()], &[role("ROLE_STAFF")])
            .unwrap());
    }

    #[test]
    fn zero_mask_ace_is_an_entry_not_a_grant() {
        let mut acl = Acl::new(oid());
        acl.insert_object_ace(role("ROLE_STAFF"), 0);
        assert!(!acl
            .is_granted(&[Permission::View.mask()], &[role("ROLE_STAFF")])
            .unwrap());
    }

    #[test]
    fn update_out_of_range_is_an_error() {
        let mut acl = Acl::new(oid());
        assert!(matches!(acl.update_object_ace(0, 1), Err(AclError::NoSuchAce(0))));
    }

    #[test]
    fn update_replaces_mask() {
        let mut acl = Acl::new(oid());
        acl.insert_object_ace(role("ROLE_STAFF"), Permission::View.mask());
        acl.update_object_ace(0, Permission::Edit.mask()).unwrap();
        assert_eq!(acl.object_aces()[0].mask(), Permission::Edit.mask());
        assert_eq!(acl.object_aces().len(), 1);
    }
}
