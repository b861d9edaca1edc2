//! Read-only queries.
//!
//! These never mutate remote state and never carry prior observations. They
//! serve callers that need to look entities up without managing them.

use tracing::debug;

use crate::core::domain::{Credential, FolderInfo, User};
use crate::core::reconcile::observe_credential;
use crate::core::remote::Remote;
use crate::error::{Action, Error, Kind, Reference, Result};

/// Read-only view of the remote vault.
pub struct Lookup<'a, R: ?Sized> {
    remote: &'a R,
}

impl<'a, R: Remote + ?Sized> Lookup<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    /// Every folder visible to the session, in listing order.
    pub fn folders(&self) -> Result<Vec<FolderInfo>> {
        let folders = self
            .remote
            .list_folders(false)
            .map_err(|e| Error::remote(Kind::Folder, "*", Action::List, e))?;
        debug!(count = folders.len(), "listed folders");
        Ok(folders.into_iter().map(FolderInfo::from).collect())
    }

    /// A credential record by id, including its secret when the remote
    /// returns one.
    ///
    /// # Errors
    ///
    /// Unlike reconciler reads, a missing record is an error here.
    pub fn credential(&self, id: &str) -> Result<Credential> {
        let resource = self
            .remote
            .get_resource(id)
            .map_err(|e| Error::remote(Kind::Credential, id, Action::Read, e))?;

        Ok(observe_credential(resource, None, None))
    }

    /// A user by exact username.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReferenceNotFound` naming the username if no user
    /// matches exactly.
    pub fn user(&self, username: &str) -> Result<User> {
        let users = self
            .remote
            .list_users(Some(username))
            .map_err(|e| Error::remote(Kind::User, username, Action::List, e))?;

        users
            .into_iter()
            .find(|u| u.username == username)
            .map(User::from)
            .ok_or_else(|| Error::ReferenceNotFound {
                kind: Kind::User,
                token: username.to_string(),
                reference: Reference::User,
                name: username.to_string(),
            })
    }
}
