//! Reference resolution.
//!
//! Desired state refers to folders and groups by human-readable name (or,
//! for folders, by id). The remote system only understands identifiers, so
//! every such reference goes through here.
//!
//! Policy:
//! - An absent or empty reference resolves to `None` without touching the
//!   remote. For folders that means "top level".
//! - A present reference that matches nothing is an error, never a silent
//!   fallback to the top level.
//! - Names are not unique upstream. The first match in listing order wins.
//! - Every call lists candidates afresh; nothing is cached, so resolving two
//!   references in one reconciliation costs two list calls.

use tracing::debug;

use crate::core::remote::Remote;
use crate::core::types::{FolderId, GroupId, UserId};
use crate::error::{Reference, ResolveError};

/// Resolves name-based references against a remote client.
pub struct Resolver<'a, R: ?Sized> {
    remote: &'a R,
}

impl<'a, R: Remote + ?Sized> Resolver<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    /// Resolve a folder reference given as a name or an id.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no reference was given, `Ok(Some(id))` on a match.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::NotFound` carrying the token verbatim when no
    /// folder has that id or name, or `ResolveError::Remote` if listing fails.
    pub fn folder(&self, token: Option<&str>) -> Result<Option<FolderId>, ResolveError> {
        let Some(token) = present(token) else {
            return Ok(None);
        };

        let folders = self.remote.list_folders(false)?;
        let found = folders
            .into_iter()
            .find(|f| f.id == token || f.name == token)
            .map(|f| f.id);

        match found {
            Some(id) => {
                debug!(token, id = %id, "resolved folder");
                Ok(Some(id))
            }
            None => Err(ResolveError::NotFound {
                reference: Reference::Folder,
                token: token.to_string(),
            }),
        }
    }

    /// Resolve a group reference given by name.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::NotFound` when no group has that name.
    pub fn group(&self, name: Option<&str>) -> Result<Option<GroupId>, ResolveError> {
        let Some(name) = present(name) else {
            return Ok(None);
        };

        let groups = self.remote.list_groups()?;
        let found = groups.into_iter().find(|g| g.name == name).map(|g| g.id);

        match found {
            Some(id) => {
                debug!(name, id = %id, "resolved group");
                Ok(Some(id))
            }
            None => Err(ResolveError::NotFound {
                reference: Reference::Group,
                token: name.to_string(),
            }),
        }
    }

    /// Resolve a group name that must be present.
    ///
    /// An empty name is treated like an unmatched one.
    pub fn require_group(&self, name: &str) -> Result<GroupId, ResolveError> {
        self.group(Some(name))?.ok_or_else(|| ResolveError::NotFound {
            reference: Reference::Group,
            token: name.to_string(),
        })
    }

    /// Resolve a username to a user id by exact match.
    pub fn user(&self, username: &str) -> Result<UserId, ResolveError> {
        let users = self.remote.list_users(Some(username))?;
        users
            .into_iter()
            .find(|u| u.username == username)
            .map(|u| u.id)
            .ok_or_else(|| ResolveError::NotFound {
                reference: Reference::User,
                token: username.to_string(),
            })
    }
}

/// Normalize an optional reference: empty means absent.
pub(crate) fn present(token: Option<&str>) -> Option<&str> {
    token.filter(|t| !t.is_empty())
}
