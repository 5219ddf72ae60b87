//! Builds ACL edit forms and applies submitted state back to the ACL

use log::debug;

use crate::error::{AclError, Result};
use crate::form::{AclForm, CheckboxField};
use crate::identity::AclCandidate;
use crate::perms::{MaskBuilder, Permission, OWNER_PERMISSIONS};
use crate::subject::AclSubject;

/// Manipulator for the ACL of one object.
///
/// `create_form` exposes one checkbox per (candidate, permission) pair,
/// seeded from the current grant state; `update_acl` recomputes each
/// candidate's mask from the submitted form and upserts its ACE, then
/// persists the ACL once.
#[derive(Debug, Clone, Copy, Default)]
pub struct AclManipulator;

impl AclManipulator {
    pub fn new() -> Self {
        AclManipulator
    }

    /// Form field key for one (candidate, permission) pair
    pub fn field_name(candidate: &AclCandidate, permission: Permission) -> String {
        format!("{}_{}", candidate.field_label(), permission.name())
    }

    /// Build the edit form for `candidates` (the subject's users when
    /// `None`), loading the object ACL on the way. The built form is stored
    /// on the subject as its users form.
    pub fn create_form(
        &self,
        subject: &mut AclSubject<'_>,
        candidates: Option<&[AclCandidate]>,
    ) -> Result<AclForm> {
        let candidates: Vec<AclCandidate> = match candidates {
            Some(c) => c.to_vec(),
            None => subject.acl_users().to_vec(),
        };
        let form = self.build_form(subject, &candidates)?;
        subject.set_users_form(form.clone());
        Ok(form)
    }

    /// Build and store the form for the subject's candidate users
    pub fn create_users_form(&self, subject: &mut AclSubject<'_>) -> Result<AclForm> {
        self.create_form(subject, None)
    }

    /// Build and store the form for the subject's candidate roles
    pub fn create_roles_form(&self, subject: &mut AclSubject<'_>) -> Result<AclForm> {
        let candidates = subject.acl_roles().to_vec();
        let form = self.build_form(subject, &candidates)?;
        subject.set_roles_form(form.clone());
        Ok(form)
    }

    fn build_form(
        &self,
        subject: &mut AclSubject<'_>,
        candidates: &[AclCandidate],
    ) -> Result<AclForm> {
        let acl = {
            let handler = subject.security_handler();
            match handler.get_object_acl(subject.object())? {
                Some(acl) => acl,
                None => handler.create_acl(subject.object())?,
            }
        };
        let security_information = subject.security_information();
        let user_permissions = subject.user_permissions();
        let masks = subject.masks().clone();

        let mut form = AclForm::new();
        for candidate in candidates {
            let sid = candidate.security_identity();
            let inherited = security_information.get(&candidate.to_string());
            for &permission in &user_permissions {
                let mask = masks.get(&permission).copied().unwrap_or_else(|| permission.mask());
                // "no entry" is an unchecked box, not an error
                let checked = match acl.is_granted(&[mask], std::slice::from_ref(&sid)) {
                    Ok(granted) => granted,
                    Err(AclError::NoAceFound) => false,
                    Err(e) => return Err(e),
                };
                // Structurally inherited permissions render disabled and
                // checked; they are excluded from write-back
                let disabled = inherited.map_or(false, |ps| ps.contains(&permission));
                form.add(CheckboxField {
                    name: Self::field_name(candidate, permission),
                    checked: checked || disabled,
                    disabled,
                });
            }
        }
        subject.set_acl(acl);
        Ok(form)
    }

    /// Apply submitted form state back to the ACL for `candidates` (the
    /// subject's users and users form when `None`), then persist once.
    pub fn update_acl(
        &self,
        subject: &mut AclSubject<'_>,
        candidates: Option<&[AclCandidate]>,
        form: Option<&AclForm>,
    ) -> Result<()> {
        let candidates: Vec<AclCandidate> = match candidates {
            Some(c) => c.to_vec(),
            None => subject.acl_users().to_vec(),
        };
        let form = match form {
            Some(f) => f.clone(),
            None => subject.users_form().cloned().ok_or(AclError::MissingForm)?,
        };
        self.apply(subject, &candidates, &form)
    }

    /// Apply the subject's users form for its candidate users
    pub fn update_users_acl(&self, subject: &mut AclSubject<'_>) -> Result<()> {
        self.update_acl(subject, None, None)
    }

    /// Apply the subject's roles form for its candidate roles
    pub fn update_roles_acl(&self, subject: &mut AclSubject<'_>) -> Result<()> {
        let candidates = subject.acl_roles().to_vec();
        let form = subject.roles_form().cloned().ok_or(AclError::MissingForm)?;
        self.apply(subject, &candidates, &form)
    }

    fn apply(
        &self,
        subject: &mut AclSubject<'_>,
        candidates: &[AclCandidate],
        form: &AclForm,
    ) -> Result<()> {
        let user_permissions = subject.user_permissions();
        let is_owner = subject.is_owner();
        let masks = subject.masks().clone();

        {
            let acl = subject.acl_mut().ok_or(AclError::MissingAcl)?;
            for candidate in candidates {
                let sid = candidate.security_identity();

                let mut builder = MaskBuilder::new();
                for &permission in &user_permissions {
                    let name = Self::field_name(candidate, permission);
                    match form.get(&name) {
                        // Disabled fields are informational only
                        Some(field) if field.checked && !field.disabled => {
                            builder.add(permission);
                        }
                        _ => {}
                    }
                }

                // Preserve OWNER and MASTER bits from the existing ACL for
                // non-owners; form input never reaches them
                if !is_owner {
                    for permission in OWNER_PERMISSIONS {
                        let mask =
                            masks.get(&permission).copied().unwrap_or_else(|| permission.mask());
                        match acl.is_granted(&[mask], std::slice::from_ref(&sid)) {
                            Ok(true) => {
                                builder.add(permission);
                            }
                            Ok(false) | Err(AclError::NoAceFound) => {}
                            Err(e) => return Err(e),
                        }
                    }
                }

                let mask = builder.get();

                // Upsert: linear scan for an existing ACE for this identity
                let index = acl
                    .object_aces()
                    .iter()
                    .position(|ace| ace.security_identity() == &sid);
                match index {
                    Some(i) => acl.update_object_ace(i, mask)?,
                    None => acl.insert_object_ace(sid, mask),
                }
            }
        }

        let acl = subject.acl().ok_or(AclError::MissingAcl)?;
        subject.security_handler().update_acl(acl)?;
        debug!(
            "updated acl for {} ({} candidates)",
            subject.object(),
            candidates.len()
        );
        Ok(())
    }
}
