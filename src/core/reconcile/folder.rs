//! Folder reconciliation.

use tracing::{debug, info, warn};

use super::{absent_ok, Reconcile};
use crate::core::domain::{Folder, FolderSpec};
use crate::core::remote::{NewFolder, Remote};
use crate::core::resolve::Resolver;
use crate::core::types::FolderId;
use crate::error::{Action, Error, Kind, Result};

/// Reconciles folders.
pub struct Folders<'a, R: ?Sized> {
    remote: &'a R,
}

impl<'a, R: Remote + ?Sized> Folders<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    fn resolve_parent(&self, desired: &FolderSpec, token: &str) -> Result<Option<FolderId>> {
        Resolver::new(self.remote)
            .folder(desired.parent.as_deref())
            .map_err(|e| Error::resolve(Kind::Folder, token, e))
    }
}

impl<R: Remote + ?Sized> Reconcile for Folders<'_, R> {
    type Desired = FolderSpec;
    type Actual = Folder;

    const KIND: Kind = Kind::Folder;

    fn create(&self, desired: &FolderSpec) -> Result<Folder> {
        let parent_id = self.resolve_parent(desired, &desired.name)?;

        let created = self
            .remote
            .create_folder(&NewFolder {
                name: desired.name.clone(),
                folder_parent_id: parent_id,
                personal: false,
            })
            .map_err(|e| Error::remote(Self::KIND, &desired.name, Action::Create, e))?;

        info!(
            id = %created.id,
            name = %created.name,
            personal = created.personal,
            "created folder"
        );
        Ok(Folder::from(created))
    }

    fn read(&self, id: &str, _prior: Option<&Folder>) -> Result<Option<Folder>> {
        let folders = self
            .remote
            .list_folders(false)
            .map_err(|e| Error::remote(Self::KIND, id, Action::List, e))?;

        match folders.into_iter().find(|f| f.id == id) {
            Some(found) => {
                debug!(id, name = %found.name, "read folder");
                Ok(Some(Folder::from(found)))
            }
            None => {
                warn!(id, "folder removed out of band");
                Ok(None)
            }
        }
    }

    /// Rename and move as needed. Unchanged folders issue no calls.
    fn update(&self, id: &str, desired: &FolderSpec, prior: &Folder) -> Result<Folder> {
        let parent_id = self.resolve_parent(desired, id)?;
        let mut current = prior.clone();
        current.id = id.to_string();

        if desired.name != prior.name {
            let updated = self
                .remote
                .update_folder(id, &desired.name)
                .map_err(|e| Error::remote(Self::KIND, id, Action::Update, e))?;
            info!(id, from = %prior.name, to = %updated.name, "renamed folder");
            current.name = updated.name;
            current.personal = updated.personal;
        }

        if parent_id != prior.parent_id {
            self.remote
                .move_folder(id, parent_id.as_deref())
                .map_err(|e| Error::remote(Self::KIND, id, Action::Move, e))?;
            info!(id, parent = ?parent_id, "moved folder");
            current.parent_id = parent_id;
        }

        Ok(current)
    }

    fn delete(&self, id: &str) -> Result<()> {
        absent_ok(Self::KIND, id, Action::Delete, self.remote.delete_folder(id))?;
        info!(id, "deleted folder");
        Ok(())
    }
}
