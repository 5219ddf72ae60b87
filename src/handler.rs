//! Security handler contract and the store-backed implementation

use std::collections::HashMap;

use crate::acl::{Acl, ObjectIdentity};
use crate::error::Result;
use crate::identity::SecurityIdentity;
use crate::perms::{Permission, ALL_PERMISSIONS};
use crate::store;

/// Structural permission information: candidate label mapped to the
/// permissions it already holds through the role hierarchy. Those render
/// disabled in forms and are never written back.
pub type SecurityInformation = HashMap<String, Vec<Permission>>;

/// Loads, creates and persists object ACLs
pub trait SecurityHandler {
    /// The permissions configurable on objects handled by this handler
    fn object_permissions(&self) -> Vec<Permission>;

    /// Load the ACL for an object, or `None` when it has none yet
    fn get_object_acl(&self, oid: &ObjectIdentity) -> Result<Option<Acl>>;

    /// Create a fresh, empty ACL for an object
    fn create_acl(&self, oid: &ObjectIdentity) -> Result<Acl>;

    /// Structural permission information for the admin's candidates
    fn build_security_information(&self, admin: &dyn AdminContext) -> SecurityInformation;

    /// Persist an ACL
    fn update_acl(&self, acl: &Acl) -> Result<()>;
}

/// The admin/domain context an ACL edit runs under
pub trait AdminContext {
    /// Whether the current editor holds `permission` on `object`
    fn is_granted(&self, permission: Permission, object: &ObjectIdentity) -> bool;

    fn security_handler(&self) -> &dyn SecurityHandler;

    /// Role hierarchy configuration: candidate label to the permissions
    /// granted structurally through it
    fn security_information(&self) -> SecurityInformation {
        SecurityInformation::new()
    }
}

/// Store-backed security handler
#[derive(Debug, Clone)]
pub struct AclSecurityHandler {
    permissions: Vec<Permission>,
}

impl AclSecurityHandler {
    pub fn new() -> Self {
        AclSecurityHandler { permissions: ALL_PERMISSIONS.to_vec() }
    }

    /// Restrict the handler to a subset of configurable permissions
    pub fn with_permissions(permissions: Vec<Permission>) -> Self {
        AclSecurityHandler { permissions }
    }
}

impl Default for AclSecurityHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityHandler for AclSecurityHandler {
    fn object_permissions(&self) -> Vec<Permission> {
        self.permissions.clone()
    }

    fn get_object_acl(&self, oid: &ObjectIdentity) -> Result<Option<Acl>> {
        store::load_acl(oid)
    }

    fn create_acl(&self, oid: &ObjectIdentity) -> Result<Acl> {
        Ok(Acl::new(oid.clone()))
    }

    fn build_security_information(&self, admin: &dyn AdminContext) -> SecurityInformation {
        admin.security_information()
    }

    fn update_acl(&self, acl: &Acl) -> Result<()> {
        store::save_acl(acl)
    }
}

/// Minimal admin context: a handler, the editing identity, and the
/// configured role hierarchy
pub struct Admin {
    handler: AclSecurityHandler,
    editor: SecurityIdentity,
    security_information: SecurityInformation,
}

impl Admin {
    pub fn new(handler: AclSecurityHandler, editor: SecurityIdentity) -> Self {
        Admin {
            handler,
            editor,
            security_information: SecurityInformation::new(),
        }
    }

    pub fn editor(&self) -> &SecurityIdentity {
        &self.editor
    }

    pub fn set_security_information(&mut self, info: SecurityInformation) {
        self.security_information = info;
    }
}

impl AdminContext for Admin {
    fn is_granted(&self, permission: Permission, object: &ObjectIdentity) -> bool {
        match self.handler.get_object_acl(object) {
            Ok(Some(acl)) => acl
                .is_granted(&[permission.mask()], std::slice::from_ref(&self.editor))
                .unwrap_or(false),
            _ => false,
        }
    }

    fn security_handler(&self) -> &dyn SecurityHandler {
        &self.handler
    }

    fn security_information(&self) -> SecurityInformation {
        self.security_information.clone()
    }
}
