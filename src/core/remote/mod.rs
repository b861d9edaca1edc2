//! Remote client abstraction.
//!
//! The remote vault is reached through an already-authenticated client.
//! Session establishment and payload encryption happen inside the client;
//! reconcilers only see plain entities and the operations below.
//!
//! ## Adding a New Client
//!
//! 1. Implement the `Remote` trait
//! 2. Map the client's "does not exist" responses to `RemoteError::NotFound`
//! 3. Hand it to `Provider::new` or `Provider::connect`

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::core::types::{FolderId, GroupId, ResourceId, UserId};
use crate::error::RemoteError;

mod memory;

pub use memory::{Call, MemoryRemote};

/// Result of a single remote call.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// The kind of principal a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aro {
    User,
    Group,
}

/// A permission entry on a folder or credential record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePermission {
    pub aro: Aro,
    pub aro_foreign_key: String,
    pub level: i32,
}

/// A requested permission change; `level == -1` revokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub aro: Aro,
    pub aro_id: String,
    pub level: i32,
}

impl Share {
    /// Share with a group at the given level.
    pub fn group(group_id: impl Into<String>, level: i32) -> Self {
        Self {
            aro: Aro::Group,
            aro_id: group_id.into(),
            level,
        }
    }
}

/// A folder as listed by the remote system.
#[derive(Debug, Clone)]
pub struct RemoteFolder {
    pub id: FolderId,
    pub name: String,
    pub folder_parent_id: Option<FolderId>,
    pub personal: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub created_by: UserId,
    pub modified_by: UserId,
    /// Only populated when listed with permissions.
    pub permissions: Vec<RemotePermission>,
}

/// Fields for a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    pub name: String,
    pub folder_parent_id: Option<FolderId>,
    pub personal: bool,
}

/// A credential record with its decrypted secret.
#[derive(Clone)]
pub struct RemoteResource {
    pub id: ResourceId,
    pub name: String,
    pub username: String,
    pub uri: String,
    pub description: String,
    pub folder_parent_id: Option<FolderId>,
    /// `None` when the remote withholds the secret.
    pub secret: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for RemoteResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResource")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("uri", &self.uri)
            .field("folder_parent_id", &self.folder_parent_id)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Fields for a new credential record.
#[derive(Clone)]
pub struct NewResource {
    pub name: String,
    pub username: String,
    pub uri: String,
    pub description: String,
    pub folder_parent_id: Option<FolderId>,
    pub secret: Zeroizing<String>,
}

impl std::fmt::Debug for NewResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewResource")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("uri", &self.uri)
            .field("folder_parent_id", &self.folder_parent_id)
            .finish_non_exhaustive()
    }
}

/// A membership entry of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMembership {
    pub user_id: UserId,
    pub is_manager: bool,
}

/// A group with its memberships.
#[derive(Debug, Clone)]
pub struct RemoteGroup {
    pub id: GroupId,
    pub name: String,
    pub memberships: Vec<RemoteMembership>,
}

/// One change to a group's membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipOp {
    /// Add the user, or set the manager flag of an existing member.
    Set { user_id: UserId, is_manager: bool },
    /// Remove the user from the group.
    Remove { user_id: UserId },
}

impl MembershipOp {
    pub fn user_id(&self) -> &str {
        match self {
            Self::Set { user_id, .. } | Self::Remove { user_id } => user_id,
        }
    }
}

/// A user account.
#[derive(Debug, Clone)]
pub struct RemoteUser {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// Fields for a new user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// Authenticated remote vault client.
///
/// Every call is a suspension point that may fail with a transport,
/// authorization or cancellation error; implementations surface those as
/// `RemoteError` and never retry on the caller's behalf.
pub trait Remote {
    /// List every folder visible to the session.
    fn list_folders(&self, with_permissions: bool) -> RemoteResult<Vec<RemoteFolder>>;

    fn create_folder(&self, folder: &NewFolder) -> RemoteResult<RemoteFolder>;

    /// Rename a folder.
    fn update_folder(&self, id: &str, name: &str) -> RemoteResult<RemoteFolder>;

    /// Move a folder under `parent`, or to the top level when `None`.
    fn move_folder(&self, id: &str, parent: Option<&str>) -> RemoteResult<()>;

    fn delete_folder(&self, id: &str) -> RemoteResult<()>;

    /// Set grantee levels on a folder. A share at level `-1` revokes.
    fn share_folder(&self, id: &str, shares: &[Share]) -> RemoteResult<()>;

    /// Fetch a credential record by id.
    fn get_resource(&self, id: &str) -> RemoteResult<RemoteResource>;

    fn create_resource(&self, resource: &NewResource) -> RemoteResult<RemoteResource>;

    /// Move a credential record into `folder`, or to the top level when `None`.
    fn move_resource(&self, id: &str, folder: Option<&str>) -> RemoteResult<()>;

    fn share_resource(&self, id: &str, shares: &[Share]) -> RemoteResult<()>;

    fn delete_resource(&self, id: &str) -> RemoteResult<()>;

    fn list_groups(&self) -> RemoteResult<Vec<RemoteGroup>>;

    fn get_group(&self, id: &str) -> RemoteResult<RemoteGroup>;

    fn create_group(&self, name: &str, ops: &[MembershipOp]) -> RemoteResult<RemoteGroup>;

    fn update_group(&self, id: &str, name: &str, ops: &[MembershipOp]) -> RemoteResult<RemoteGroup>;

    fn delete_group(&self, id: &str) -> RemoteResult<()>;

    /// List users, optionally filtered by a free-text search.
    fn list_users(&self, search: Option<&str>) -> RemoteResult<Vec<RemoteUser>>;

    fn create_user(&self, user: &NewUser) -> RemoteResult<RemoteUser>;

    /// Overwrite role and profile of a user.
    fn update_user(
        &self,
        id: &str,
        role: &str,
        first_name: &str,
        last_name: &str,
    ) -> RemoteResult<RemoteUser>;

    fn delete_user(&self, id: &str) -> RemoteResult<()>;
}

impl<R: Remote + ?Sized> Remote for &R {
    fn list_folders(&self, with_permissions: bool) -> RemoteResult<Vec<RemoteFolder>> {
        (**self).list_folders(with_permissions)
    }

    fn create_folder(&self, folder: &NewFolder) -> RemoteResult<RemoteFolder> {
        (**self).create_folder(folder)
    }

    fn update_folder(&self, id: &str, name: &str) -> RemoteResult<RemoteFolder> {
        (**self).update_folder(id, name)
    }

    fn move_folder(&self, id: &str, parent: Option<&str>) -> RemoteResult<()> {
        (**self).move_folder(id, parent)
    }

    fn delete_folder(&self, id: &str) -> RemoteResult<()> {
        (**self).delete_folder(id)
    }

    fn share_folder(&self, id: &str, shares: &[Share]) -> RemoteResult<()> {
        (**self).share_folder(id, shares)
    }

    fn get_resource(&self, id: &str) -> RemoteResult<RemoteResource> {
        (**self).get_resource(id)
    }

    fn create_resource(&self, resource: &NewResource) -> RemoteResult<RemoteResource> {
        (**self).create_resource(resource)
    }

    fn move_resource(&self, id: &str, folder: Option<&str>) -> RemoteResult<()> {
        (**self).move_resource(id, folder)
    }

    fn share_resource(&self, id: &str, shares: &[Share]) -> RemoteResult<()> {
        (**self).share_resource(id, shares)
    }

    fn delete_resource(&self, id: &str) -> RemoteResult<()> {
        (**self).delete_resource(id)
    }

    fn list_groups(&self) -> RemoteResult<Vec<RemoteGroup>> {
        (**self).list_groups()
    }

    fn get_group(&self, id: &str) -> RemoteResult<RemoteGroup> {
        (**self).get_group(id)
    }

    fn create_group(&self, name: &str, ops: &[MembershipOp]) -> RemoteResult<RemoteGroup> {
        (**self).create_group(name, ops)
    }

    fn update_group(
        &self,
        id: &str,
        name: &str,
        ops: &[MembershipOp],
    ) -> RemoteResult<RemoteGroup> {
        (**self).update_group(id, name, ops)
    }

    fn delete_group(&self, id: &str) -> RemoteResult<()> {
        (**self).delete_group(id)
    }

    fn list_users(&self, search: Option<&str>) -> RemoteResult<Vec<RemoteUser>> {
        (**self).list_users(search)
    }

    fn create_user(&self, user: &NewUser) -> RemoteResult<RemoteUser> {
        (**self).create_user(user)
    }

    fn update_user(
        &self,
        id: &str,
        role: &str,
        first_name: &str,
        last_name: &str,
    ) -> RemoteResult<RemoteUser> {
        (**self).update_user(id, role, first_name, last_name)
    }

    fn delete_user(&self, id: &str) -> RemoteResult<()> {
        (**self).delete_user(id)
    }
}
