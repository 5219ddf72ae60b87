//! AclSubject holds everything one ACL edit request touches

use std::collections::BTreeMap;

use crate::acl::{Acl, ObjectIdentity};
use crate::form::AclForm;
use crate::handler::{AdminContext, SecurityHandler, SecurityInformation};
use crate::identity::AclCandidate;
use crate::perms::{Permission, OWNER_PERMISSIONS};

/// Per-request data holder for an object ACL edit: the admin context, the
/// target object, the candidate users and roles, the cached permission to
/// mask table, the loaded ACL, and the generated forms. Created once per
/// edit request, mutated by the manipulator, then discarded.
pub struct AclSubject<'a> {
    admin: &'a dyn AdminContext,
    object: ObjectIdentity,
    acl_users: Vec<AclCandidate>,
    acl_roles: Vec<AclCandidate>,
    permissions: Vec<Permission>,
    masks: BTreeMap<Permission, u64>,
    acl: Option<Acl>,
    users_form: Option<AclForm>,
    roles_form: Option<AclForm>,
}

impl<'a> AclSubject<'a> {
    pub fn new(
        admin: &'a dyn AdminContext,
        object: ObjectIdentity,
        acl_users: Vec<AclCandidate>,
        acl_roles: Vec<AclCandidate>,
    ) -> Self {
        let permissions = admin.security_handler().object_permissions();
        // Cache of permission name to bit value
        let masks = permissions.iter().map(|&p| (p, p.mask())).collect();
        AclSubject {
            admin,
            object,
            acl_users,
            acl_roles,
            permissions,
            masks,
            acl: None,
            users_form: None,
            roles_form: None,
        }
    }

    pub fn admin(&self) -> &dyn AdminContext {
        self.admin
    }

    pub fn object(&self) -> &ObjectIdentity {
        &self.object
    }

    pub fn acl_users(&self) -> &[AclCandidate] {
        &self.acl_users
    }

    pub fn acl_roles(&self) -> &[AclCandidate] {
        &self.acl_roles
    }

    /// Cached permission to mask table
    pub fn masks(&self) -> &BTreeMap<Permission, u64> {
        &self.masks
    }

    /// All configurable permissions, in handler order
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Permissions the current editor may set: everything, minus the
    /// owner-only subset unless the editor holds OWNER on the object
    pub fn user_permissions(&self) -> Vec<Permission> {
        let mut permissions = self.permissions.clone();
        if !self.is_owner() {
            permissions.retain(|p| !OWNER_PERMISSIONS.contains(p));
        }
        permissions
    }

    /// Only an owner can set MASTER and OWNER
    pub fn is_owner(&self) -> bool {
        self.admin.is_granted(Permission::Owner, &self.object)
    }

    pub fn security_handler(&self) -> &dyn SecurityHandler {
        self.admin.security_handler()
    }

    pub fn security_information(&self) -> SecurityInformation {
        self.admin.security_handler().build_security_information(self.admin)
    }

    pub fn acl(&self) -> Option<&Acl> {
        self.acl.as_ref()
    }

    pub fn acl_mut(&mut self) -> Option<&mut Acl> {
        self.acl.as_mut()
    }

    pub fn set_acl(&mut self, acl: Acl) {
        self.acl = Some(acl);
    }

    pub fn users_form(&self) -> Option<&AclForm> {
        self.users_form.as_ref()
    }

    pub fn set_users_form(&mut self, form: AclForm) {
        self.users_form = Some(form);
    }

    pub fn users_form_mut(&mut self) -> Option<&mut AclForm> {
        self.users_form.as_mut()
    }

    pub fn roles_form(&self) -> Option<&AclForm> {
        self.roles_form.as_ref()
    }

    pub fn set_roles_form(&mut self, form: AclForm) {
        self.roles_form = Some(form);
    }

    pub fn roles_form_mut(&mut self) -> Option<&mut AclForm> {
        self.roles_form.as_mut()
    }
}
