//! LMDB-backed ACL storage
//!
//! Keys are length-prefixed multi-part strings:
//! `[object "type:id"][identity "user:alice"] -> mask`. No delimiters, no
//! escaping, and prefix iteration over the object part yields the object's
//! whole ACL in a stable order.

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use heed::types::{Bytes, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use log::debug;

use crate::acl::{AccessControlEntry, Acl, ObjectIdentity};
use crate::error::{AclError, Result};
use crate::identity::SecurityIdentity;

type AceDb = Database<Bytes, U64<byteorder::BigEndian>>;

struct Store {
    aces: AceDb,
}

// Global state
static ENV: OnceLock<Env> = OnceLock::new();
static STORE: OnceLock<Store> = OnceLock::new();
static INIT_PATH: OnceLock<String> = OnceLock::new();
static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Build a length-prefixed key from parts
#[inline]
fn build_key(parts: &[&str]) -> Vec<u8> {
    let total_len: usize = parts.iter().map(|p| 1 + p.len()).sum();
    let mut key = Vec::with_capacity(total_len);
    for part in parts {
        key.push(part.len() as u8);
        key.extend_from_slice(part.as_bytes());
    }
    key
}

/// Get the Nth part from a key without allocating
fn get_part(bytes: &[u8], n: usize) -> Option<&str> {
    let mut i = 0;
    let mut count = 0;
    while i < bytes.len() {
        let len = bytes[i] as usize;
        if i + 1 + len > bytes.len() {
            return None;
        }
        if count == n {
            return std::str::from_utf8(&bytes[i + 1..i + 1 + len]).ok();
        }
        i += 1 + len;
        count += 1;
    }
    None
}

#[inline]
fn store() -> Result<&'static Store> {
    STORE.get().ok_or(AclError::NotInitialized)
}

#[inline]
fn env() -> Result<&'static Env> {
    ENV.get().ok_or(AclError::NotInitialized)
}

/// Execute a read-only operation
fn read<T, F: FnOnce(&Store, &RoTxn) -> Result<T>>(f: F) -> Result<T> {
    f(store()?, &env()?.read_txn()?)
}

/// Execute a write operation in one committed transaction
fn write<T, F: FnOnce(&Store, &mut RwTxn) -> Result<T>>(f: F) -> Result<T> {
    let mut txn = env()?.write_txn()?;
    let r = f(store()?, &mut txn)?;
    txn.commit()?;
    Ok(r)
}

/// Initialize the store. Idempotent for the same path, an error otherwise.
pub fn init(path: &str) -> Result<()> {
    if let Some(p) = INIT_PATH.get() {
        return if p == path {
            Ok(())
        } else {
            Err(AclError::AlreadyInitialized(p.clone()))
        };
    }
    std::fs::create_dir_all(path)?;
    // SAFETY: LMDB requires no other process access this path during open.
    let e = unsafe {
        EnvOpenOptions::new()
            .map_size(1 << 30)
            .max_dbs(1)
            .open(Path::new(path))?
    };
    let mut tx = e.write_txn()?;
    let aces: AceDb = e.create_database(&mut tx, Some("aces"))?;
    tx.commit()?;
    let _ = (ENV.set(e), STORE.set(Store { aces }), INIT_PATH.set(path.to_string()));
    debug!("acl store initialized at {}", path);
    Ok(())
}

/// Clear all stored ACEs (for testing)
pub fn clear_all() -> Result<()> {
    write(|s, tx| Ok(s.aces.clear(tx)?))
}

/// Get the test lock (for single-threaded tests)
pub fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

/// Load the ACL for an object, or `None` when no ACE exists for it
pub(crate) fn load_acl(oid: &ObjectIdentity) -> Result<Option<Acl>> {
    read(|s, tx| {
        let prefix = build_key(&[&oid.to_string()]);
        let mut entries = Vec::new();
        for item in s.aces.prefix_iter(tx, prefix.as_slice())? {
            let (k, mask) = item?;
            if let Some(sid) = get_part(k, 1).and_then(SecurityIdentity::parse) {
                entries.push(AccessControlEntry::new(sid, mask));
            }
        }
        if entries.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Acl::with_entries(oid.clone(), entries)))
        }
    })
}

/// Persist an ACL, rewriting the object's whole key range so removed
/// entries do not survive. Idempotent.
pub(crate) fn save_acl(acl: &Acl) -> Result<()> {
    let object = acl.object_identity().to_string();
    write(|s, tx| {
        let prefix = build_key(&[&object]);
        let stale: Vec<Vec<u8>> = {
            let mut keys = Vec::new();
            for item in s.aces.prefix_iter(tx, prefix.as_slice())? {
                let (k, _) = item?;
                keys.push(k.to_vec());
            }
            keys
        };
        for k in &stale {
            s.aces.delete(tx, k.as_slice())?;
        }
        for ace in acl.object_aces() {
            let k = build_key(&[&object, &ace.security_identity().to_string()]);
            s.aces.put(tx, k.as_slice(), &ace.mask())?;
        }
        debug!("persisted acl for {} ({} aces)", object, acl.object_aces().len());
        Ok(())
    })
}
