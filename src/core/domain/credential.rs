//! Credential record models.
//!
//! The secret value is write-mostly: the remote may omit it on read, so the
//! observed model keeps it optional and the reconciler carries the previous
//! value forward instead of blanking it.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::core::types::{FolderId, NameOrId, ResourceId};

/// Desired shape of a credential record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub username: String,
    pub uri: String,
    pub secret: Zeroizing<String>,
    /// Name or id of the containing folder. Absent or empty means top level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<NameOrId>,
    /// Name of a group the record is shared with at `update` level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_group: Option<String>,
}

impl CredentialSpec {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        uri: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            username: username.into(),
            uri: uri.into(),
            secret: Zeroizing::new(secret.into()),
            folder: None,
            share_group: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn in_folder(mut self, folder: impl Into<NameOrId>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn shared_with(mut self, group: impl Into<String>) -> Self {
        self.share_group = Some(group.into());
        self
    }
}

impl std::fmt::Debug for CredentialSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("username", &self.username)
            .field("uri", &self.uri)
            .field("secret", &"<redacted>")
            .field("folder", &self.folder)
            .field("share_group", &self.share_group)
            .finish()
    }
}

/// Observed state of a credential record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: ResourceId,
    pub name: String,
    pub description: Option<String>,
    pub username: String,
    pub uri: String,
    /// Last known secret. `None` only if it was never observed.
    #[serde(default)]
    pub secret: Option<Zeroizing<String>>,
    pub folder_id: Option<FolderId>,
    /// Carried from the last applied desired state; sharing is not read back.
    #[serde(default)]
    pub share_group: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("username", &self.username)
            .field("uri", &self.uri)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("folder_id", &self.folder_id)
            .field("share_group", &self.share_group)
            .finish()
    }
}
