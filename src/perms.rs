//! Permission bits and the mask builder

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AclError, Result};

/// Object-level permissions, one bit each.
///
/// The bit layout is fixed by the mask strategy: a persisted mask keeps its
/// meaning across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    View,
    Create,
    Edit,
    Delete,
    Undelete,
    Operator,
    Master,
    Owner,
}

impl Permission {
    /// The bit value for this permission
    #[inline]
    pub const fn mask(self) -> u64 {
        match self {
            Permission::View => 1,
            Permission::Create => 1 << 1,
            Permission::Edit => 1 << 2,
            Permission::Delete => 1 << 3,
            Permission::Undelete => 1 << 4,
            Permission::Operator => 1 << 5,
            Permission::Master => 1 << 6,
            Permission::Owner => 1 << 7,
        }
    }

    /// Canonical upper-case name, as used in form field keys
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Permission::View => "VIEW",
            Permission::Create => "CREATE",
            Permission::Edit => "EDIT",
            Permission::Delete => "DELETE",
            Permission::Undelete => "UNDELETE",
            Permission::Operator => "OPERATOR",
            Permission::Master => "MASTER",
            Permission::Owner => "OWNER",
        }
    }

    /// Look up a permission by its canonical name
    pub fn from_name(name: &str) -> Result<Permission> {
        ALL_PERMISSIONS
            .iter()
            .copied()
            .find(|p| p.name() == name)
            .ok_or_else(|| AclError::UnknownPermission(name.to_string()))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every permission, in bit order
pub const ALL_PERMISSIONS: [Permission; 8] = [
    Permission::View,
    Permission::Create,
    Permission::Edit,
    Permission::Delete,
    Permission::Undelete,
    Permission::Operator,
    Permission::Master,
    Permission::Owner,
];

/// Permissions only a grantee holding OWNER may set
pub const OWNER_PERMISSIONS: [Permission; 2] = [Permission::Master, Permission::Owner];

/// Convert a mask to the list of permission names it covers
pub fn mask_to_names(mask: u64) -> Vec<&'static str> {
    ALL_PERMISSIONS
        .iter()
        .filter(|p| mask & p.mask() == p.mask())
        .map(|p| p.name())
        .collect()
}

/// Convert a list of permission names to a mask, ignoring unknown names
pub fn names_to_mask(names: &[&str]) -> u64 {
    names
        .iter()
        .filter_map(|n| Permission::from_name(n).ok())
        .fold(0, |acc, p| acc | p.mask())
}

/// OR-accumulator for building a permission mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskBuilder(u64);

impl MaskBuilder {
    #[inline]
    pub fn new() -> Self {
        MaskBuilder(0)
    }

    /// Add one permission's bit to the mask
    #[inline]
    pub fn add(&mut self, permission: Permission) -> &mut Self {
        self.0 |= permission.mask();
        self
    }

    /// The accumulated mask
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
