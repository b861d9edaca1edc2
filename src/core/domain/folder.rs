//! Folder models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::remote::RemoteFolder;
use crate::core::types::{FolderId, NameOrId, UserId};

/// Desired shape of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSpec {
    pub name: String,
    /// Name or id of the parent folder. Absent or empty means top level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NameOrId>,
}

impl FolderSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    /// Place the folder under `parent` (a name or an id).
    pub fn under(mut self, parent: impl Into<NameOrId>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Observed state of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// Resolved parent id, never the name the caller declared.
    pub parent_id: Option<FolderId>,
    pub personal: bool,
}

impl From<RemoteFolder> for Folder {
    fn from(f: RemoteFolder) -> Self {
        Self {
            id: f.id,
            name: f.name,
            parent_id: f.folder_parent_id.filter(|p| !p.is_empty()),
            personal: f.personal,
        }
    }
}

/// A folder as reported by the folder listing, with authorship metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub id: FolderId,
    pub name: String,
    pub parent_id: Option<FolderId>,
    pub personal: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub created_by: UserId,
    pub modified_by: UserId,
}

impl From<RemoteFolder> for FolderInfo {
    fn from(f: RemoteFolder) -> Self {
        Self {
            id: f.id,
            name: f.name,
            parent_id: f.folder_parent_id.filter(|p| !p.is_empty()),
            personal: f.personal,
            created: f.created,
            modified: f.modified,
            created_by: f.created_by,
            modified_by: f.modified_by,
        }
    }
}
