//! Folder permission grant reconciliation.
//!
//! A grant is the level one group holds on one folder. There is no grant
//! object upstream: creating, changing and revoking all go through the
//! folder share call, and reading means finding the group's entry in the
//! folder's permission list. Sharing at `delete` revokes.

use tracing::{debug, info, warn};

use super::{absent_ok, Reconcile};
use crate::core::constants::LEVEL_REVOKE;
use crate::core::domain::{Grant, GrantId, GrantSpec};
use crate::core::permission;
use crate::core::remote::{Aro, Remote, Share};
use crate::core::resolve::Resolver;
use crate::core::types::GroupId;
use crate::error::{Action, Error, Kind, ResolveError, Result};

/// Reconciles group grants on folders.
pub struct FolderPermissions<'a, R: ?Sized> {
    remote: &'a R,
}

impl<'a, R: Remote + ?Sized> FolderPermissions<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    /// Resolve a group that may have been deleted since the grant was made.
    fn existing_group(&self, name: &str, token: &str) -> Result<Option<GroupId>> {
        match Resolver::new(self.remote).require_group(name) {
            Ok(id) => Ok(Some(id)),
            Err(ResolveError::NotFound { .. }) => Ok(None),
            Err(e) => Err(Error::resolve(Self::KIND, token, e)),
        }
    }

    fn share(&self, folder_id: &str, group_id: &str, level: i32, token: &str) -> Result<()> {
        self.remote
            .share_folder(folder_id, &[Share::group(group_id, level)])
            .map_err(|e| Error::remote(Self::KIND, token, Action::Share, e))
    }

    /// Encode the level and resolve the group, in that order, before any call
    /// that mutates.
    fn prepare(&self, desired: &GrantSpec, token: &str) -> Result<(i32, GroupId)> {
        let level = permission::to_level(&desired.permission)
            .map_err(|e| Error::permission(Self::KIND, token, e))?;
        let group_id = Resolver::new(self.remote)
            .require_group(&desired.group)
            .map_err(|e| Error::resolve(Self::KIND, token, e))?;
        Ok((level, group_id))
    }
}

impl<R: Remote + ?Sized> Reconcile for FolderPermissions<'_, R> {
    type Desired = GrantSpec;
    type Actual = Grant;

    const KIND: Kind = Kind::FolderPermission;

    fn create(&self, desired: &GrantSpec) -> Result<Grant> {
        let grant_id = desired.grant_id();
        let token = grant_id.to_string();
        let (level, group_id) = self.prepare(desired, &token)?;

        self.share(&desired.folder_id, &group_id, level, &token)?;

        info!(id = %token, permission = %desired.permission, "granted folder permission");
        Ok(Grant::new(&grant_id, desired.permission.clone()))
    }

    /// Reconstruct a grant from its `<folder_id>:<group_name>` identifier.
    fn read(&self, id: &str, _prior: Option<&Grant>) -> Result<Option<Grant>> {
        let grant_id: GrantId = id.parse()?;

        let Some(group_id) = self.existing_group(&grant_id.group_name, id)? else {
            warn!(id, "grant group removed out of band");
            return Ok(None);
        };

        let folders = self
            .remote
            .list_folders(true)
            .map_err(|e| Error::remote(Self::KIND, id, Action::List, e))?;

        let Some(folder) = folders.into_iter().find(|f| f.id == grant_id.folder_id) else {
            warn!(id, "grant folder removed out of band");
            return Ok(None);
        };

        let level = folder
            .permissions
            .iter()
            .find(|p| p.aro == Aro::Group && p.aro_foreign_key == group_id)
            .map(|p| p.level);

        match level {
            Some(level) => {
                let symbol = permission::to_symbol(level);
                debug!(id, level, permission = symbol, "read folder permission");
                Ok(Some(Grant::new(&grant_id, symbol)))
            }
            None => {
                debug!(id, "group holds no permission on folder");
                Ok(None)
            }
        }
    }

    /// Change the level, or move the grant to a new (folder, group) pair.
    ///
    /// Moving shares the new pair first, then revokes the old one, and
    /// yields a new identifier.
    fn update(&self, id: &str, desired: &GrantSpec, prior: &Grant) -> Result<Grant> {
        let grant_id = desired.grant_id();
        let token = grant_id.to_string();
        let (level, group_id) = self.prepare(desired, id)?;
        let retargeted = grant_id != prior.grant_id();

        if !retargeted && desired.permission == prior.permission {
            debug!(id, "folder permission already converged");
            return Ok(prior.clone());
        }

        let stale_group = if retargeted {
            self.existing_group(&prior.group, id)?
        } else {
            None
        };

        self.share(&desired.folder_id, &group_id, level, &token)?;
        info!(id = %token, permission = %desired.permission, "updated folder permission");

        if let Some(old_group) = stale_group {
            absent_ok(
                Self::KIND,
                id,
                Action::Share,
                self.remote
                    .share_folder(&prior.folder_id, &[Share::group(old_group, LEVEL_REVOKE)]),
            )
            .map_err(|e| Error::partially_applied(Self::KIND, id, &token, e))?;
            info!(id, "revoked folder permission");
        }

        Ok(Grant::new(&grant_id, desired.permission.clone()))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let grant_id: GrantId = id.parse()?;

        let Some(group_id) = self.existing_group(&grant_id.group_name, id)? else {
            debug!(id, "grant group already absent");
            return Ok(());
        };

        absent_ok(
            Self::KIND,
            id,
            Action::Share,
            self.remote
                .share_folder(&grant_id.folder_id, &[Share::group(group_id, LEVEL_REVOKE)]),
        )?;
        info!(id, "revoked folder permission");
        Ok(())
    }
}
