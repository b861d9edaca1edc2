//! Permission codec.
//!
//! Maps symbolic permission levels to the integer access levels the remote
//! system stores, and back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::constants::{LEVEL_OWNER, LEVEL_READ, LEVEL_REVOKE, LEVEL_UPDATE, UNKNOWN_SYMBOL};
use crate::error::PermissionError;

/// A symbolic permission level.
///
/// `Delete` is a sentinel: granting it revokes every level for the grantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Update,
    Owner,
    Delete,
}

impl Permission {
    /// Remote access level.
    pub const fn level(self) -> i32 {
        match self {
            Self::Read => LEVEL_READ,
            Self::Update => LEVEL_UPDATE,
            Self::Owner => LEVEL_OWNER,
            Self::Delete => LEVEL_REVOKE,
        }
    }

    /// Symbolic level for a remote access level, if recognized.
    pub const fn from_level(level: i32) -> Option<Self> {
        match level {
            LEVEL_READ => Some(Self::Read),
            LEVEL_UPDATE => Some(Self::Update),
            LEVEL_OWNER => Some(Self::Owner),
            LEVEL_REVOKE => Some(Self::Delete),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Update => "update",
            Self::Owner => "owner",
            Self::Delete => "delete",
        }
    }

    /// Whether granting this level removes the grant.
    pub const fn is_revoke(self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "owner" => Ok(Self::Owner),
            "delete" => Ok(Self::Delete),
            other => Err(PermissionError::Invalid {
                value: other.to_string(),
            }),
        }
    }
}

/// Encode a permission symbol as a remote access level.
///
/// # Errors
///
/// Returns `PermissionError::Invalid` for anything other than
/// `read`, `update`, `owner` or `delete`.
pub fn to_level(symbol: &str) -> Result<i32, PermissionError> {
    symbol.parse::<Permission>().map(Permission::level)
}

/// Decode a remote access level into its symbol.
///
/// Levels the codec does not know decode to `"unknown"` so that reading a
/// grant never fails on a level introduced by a newer remote.
pub fn to_symbol(level: i32) -> &'static str {
    Permission::from_level(level)
        .map(Permission::as_str)
        .unwrap_or(UNKNOWN_SYMBOL)
}
