//! Owner-permission invariants: MASTER and OWNER bits are settable only by
//! an editor holding OWNER; for everyone else they are preserved from the
//! existing ACL.

use std::sync::Once;

use acledit::{
    clear_all, init, test_lock, Acl, AclCandidate, AclForm, AclManipulator, AclSecurityHandler,
    AclSubject, Admin, CheckboxField, ObjectIdentity, Permission, SecurityHandler,
    SecurityIdentity,
};
use tempfile::TempDir;

static INIT: Once = Once::new();
static mut TEST_DIR: Option<TempDir> = None;

fn setup() {
    INIT.call_once(|| {
        let dir = TempDir::new().unwrap();
        init(dir.path().to_str().unwrap()).unwrap();
        unsafe { TEST_DIR = Some(dir); }
    });
}

fn setup_clean() -> std::sync::MutexGuard<'static, ()> {
    let lock = test_lock();
    setup();
    clear_all().unwrap();
    lock
}

fn object() -> ObjectIdentity {
    ObjectIdentity::new("post", "42")
}

fn seed_ace(oid: &ObjectIdentity, sid: SecurityIdentity, mask: u64) {
    let handler = AclSecurityHandler::new();
    let mut acl = handler
        .get_object_acl(oid)
        .unwrap()
        .unwrap_or_else(|| Acl::new(oid.clone()));
    acl.insert_object_ace(sid, mask);
    handler.update_acl(&acl).unwrap();
}

fn stored_mask(oid: &ObjectIdentity, sid: &SecurityIdentity) -> Option<u64> {
    let handler = AclSecurityHandler::new();
    handler.get_object_acl(oid).unwrap().and_then(|acl| {
        acl.object_aces()
            .iter()
            .find(|ace| ace.security_identity() == sid)
            .map(|ace| ace.mask())
    })
}

fn non_owner_admin() -> Admin {
    Admin::new(AclSecurityHandler::new(), SecurityIdentity::User("editor".into()))
}

fn owner_admin(oid: &ObjectIdentity) -> Admin {
    seed_ace(oid, SecurityIdentity::User("boss".into()), Permission::Owner.mask());
    Admin::new(AclSecurityHandler::new(), SecurityIdentity::User("boss".into()))
}

#[test]
fn non_owner_update_preserves_existing_owner_bits() {
    let _lock = setup_clean();
    let oid = object();
    let sid = SecurityIdentity::Role("ROLE_SUB".into());
    seed_ace(
        &oid,
        sid.clone(),
        Permission::Master.mask() | Permission::Owner.mask() | Permission::View.mask(),
    );

    let admin = non_owner_admin();
    assert!(!subject_is_owner(&admin, &oid));
    let mut subject =
        AclSubject::new(&admin, oid.clone(), vec![], vec![AclCandidate::role("ROLE_SUB")]);
    let manipulator = AclManipulator::new();
    manipulator.create_roles_form(&mut subject).unwrap();

    let form = subject.roles_form_mut().unwrap();
    form.set_data("ROLE_SUB_VIEW", false);
    form.set_data("ROLE_SUB_EDIT", true);

    manipulator.update_roles_acl(&mut subject).unwrap();

    // The edit took effect, but MASTER and OWNER survived untouched
    assert_eq!(
        stored_mask(&oid, &sid),
        Some(Permission::Edit.mask() | Permission::Master.mask() | Permission::Owner.mask())
    );
}

fn subject_is_owner(admin: &Admin, oid: &ObjectIdentity) -> bool {
    AclSubject::new(admin, oid.clone(), vec![], vec![]).is_owner()
}

#[test]
fn non_owner_cannot_grant_owner_bits_via_injected_fields() {
    let _lock = setup_clean();
    let oid = object();
    let sid = SecurityIdentity::Role("ROLE_SUB".into());
    let candidates = vec![AclCandidate::role("ROLE_SUB")];

    let admin = non_owner_admin();
    let mut subject = AclSubject::new(&admin, oid.clone(), vec![], candidates.clone());
    let manipulator = AclManipulator::new();
    let mut form: AclForm = manipulator.create_roles_form(&mut subject).unwrap();

    // A hostile client submits extra checked fields for the privileged bits
    form.add(CheckboxField {
        name: "ROLE_SUB_MASTER".into(),
        checked: true,
        disabled: false,
    });
    form.add(CheckboxField {
        name: "ROLE_SUB_OWNER".into(),
        checked: true,
        disabled: false,
    });
    form.set_data("ROLE_SUB_VIEW", true);

    manipulator.update_acl(&mut subject, Some(&candidates), Some(&form)).unwrap();

    // Injected fields are never read: the identity had no owner bits and
    // gains none
    assert_eq!(stored_mask(&oid, &sid), Some(Permission::View.mask()));
}

#[test]
fn owner_submission_fully_determines_owner_bits() {
    let _lock = setup_clean();
    let oid = object();
    let sid = SecurityIdentity::Role("ROLE_SUB".into());
    seed_ace(
        &oid,
        sid.clone(),
        Permission::Master.mask() | Permission::Owner.mask(),
    );

    let admin = owner_admin(&oid);
    let mut subject =
        AclSubject::new(&admin, oid.clone(), vec![], vec![AclCandidate::role("ROLE_SUB")]);
    assert!(subject.is_owner());
    let manipulator = AclManipulator::new();
    manipulator.create_roles_form(&mut subject).unwrap();

    let form = subject.roles_form_mut().unwrap();
    assert!(form.data("ROLE_SUB_MASTER"));
    assert!(form.data("ROLE_SUB_OWNER"));
    form.set_data("ROLE_SUB_MASTER", false);
    form.set_data("ROLE_SUB_OWNER", false);
    form.set_data("ROLE_SUB_VIEW", true);

    manipulator.update_roles_acl(&mut subject).unwrap();

    // For an owner the submission wins: the previously held owner bits are
    // gone
    assert_eq!(stored_mask(&oid, &sid), Some(Permission::View.mask()));
}

#[test]
fn owner_can_grant_owner_bits() {
    let _lock = setup_clean();
    let oid = object();
    let sid = SecurityIdentity::User("alice".into());

    let admin = owner_admin(&oid);
    let mut subject =
        AclSubject::new(&admin, oid.clone(), vec![AclCandidate::user("alice")], vec![]);
    let manipulator = AclManipulator::new();
    manipulator.create_users_form(&mut subject).unwrap();

    let form = subject.users_form_mut().unwrap();
    form.set_data("alice_MASTER", true);
    form.set_data("alice_OWNER", true);

    manipulator.update_users_acl(&mut subject).unwrap();

    assert_eq!(
        stored_mask(&oid, &sid),
        Some(Permission::Master.mask() | Permission::Owner.mask())
    );
}
