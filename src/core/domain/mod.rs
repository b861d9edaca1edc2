//! Domain types.
//!
//! Each entity kind has a desired model (`*Spec`, what the caller declares,
//! with references by name) and an observed model (what the remote reports,
//! with references resolved to ids).

mod credential;
mod folder;
mod grant;
mod group;
mod user;

use serde::{Deserialize, Serialize};

use crate::error::Kind;

pub use credential::{Credential, CredentialSpec};
pub use folder::{Folder, FolderInfo, FolderSpec};
pub use grant::{Grant, GrantId, GrantSpec};
pub use group::{Group, GroupSpec};
pub use user::{User, UserSpec};

/// Desired state of any entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Desired {
    Folder(FolderSpec),
    Credential(CredentialSpec),
    Group(GroupSpec),
    User(UserSpec),
    FolderPermission(GrantSpec),
}

impl Desired {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Folder(_) => Kind::Folder,
            Self::Credential(_) => Kind::Credential,
            Self::Group(_) => Kind::Group,
            Self::User(_) => Kind::User,
            Self::FolderPermission(_) => Kind::FolderPermission,
        }
    }
}

/// Observed state of any entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actual {
    Folder(Folder),
    Credential(Credential),
    Group(Group),
    User(User),
    FolderPermission(Grant),
}

impl Actual {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Folder(_) => Kind::Folder,
            Self::Credential(_) => Kind::Credential,
            Self::Group(_) => Kind::Group,
            Self::User(_) => Kind::User,
            Self::FolderPermission(_) => Kind::FolderPermission,
        }
    }

    /// The identifier the caller must store for subsequent calls.
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(f) => &f.id,
            Self::Credential(c) => &c.id,
            Self::Group(g) => &g.id,
            Self::User(u) => &u.id,
            Self::FolderPermission(g) => &g.id,
        }
    }
}
