//! Folder permission grant models.
//!
//! A grant is identified by the pair (folder, group). Its identifier is
//! `<folder_id>:<group_name>`; the first `:` separates the parts so group
//! names may themselves contain colons.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::constants::GRANT_ID_DELIMITER;
use crate::core::types::FolderId;
use crate::error::{Error, Kind};

/// Composite identifier of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GrantId {
    pub folder_id: FolderId,
    pub group_name: String,
}

impl GrantId {
    pub fn new(folder_id: impl Into<FolderId>, group_name: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            group_name: group_name.into(),
        }
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.folder_id, GRANT_ID_DELIMITER, self.group_name)
    }
}

impl FromStr for GrantId {
    type Err = Error;

    /// Parse `<folder_id>:<group_name>`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidImportId` if the delimiter is missing or
    /// either part is empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(GRANT_ID_DELIMITER) {
            Some((folder, group)) if !folder.is_empty() && !group.is_empty() => {
                Ok(Self::new(folder, group))
            }
            _ => Err(Error::InvalidImportId {
                kind: Kind::FolderPermission,
                id: s.to_string(),
            }),
        }
    }
}

/// Desired grant of a group on a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSpec {
    pub folder_id: FolderId,
    pub group: String,
    /// One of `read`, `update`, `owner`, or `delete` to revoke.
    pub permission: String,
}

impl GrantSpec {
    pub fn new(
        folder_id: impl Into<FolderId>,
        group: impl Into<String>,
        permission: impl Into<String>,
    ) -> Self {
        Self {
            folder_id: folder_id.into(),
            group: group.into(),
            permission: permission.into(),
        }
    }

    pub fn grant_id(&self) -> GrantId {
        GrantId::new(self.folder_id.clone(), self.group.clone())
    }
}

/// Observed grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Always `<folder_id>:<group>`.
    pub id: String,
    pub folder_id: FolderId,
    pub group: String,
    /// Symbolic level; `unknown` for levels the codec does not recognize.
    pub permission: String,
}

impl Grant {
    pub fn new(grant_id: &GrantId, permission: impl Into<String>) -> Self {
        Self {
            id: grant_id.to_string(),
            folder_id: grant_id.folder_id.clone(),
            group: grant_id.group_name.clone(),
            permission: permission.into(),
        }
    }

    pub fn grant_id(&self) -> GrantId {
        GrantId::new(self.folder_id.clone(), self.group.clone())
    }
}
