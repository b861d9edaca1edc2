//! Credential record reconciliation.
//!
//! The remote has no in-place field update for credential records. Content
//! changes (name, username, uri, description, secret) are applied by
//! deleting the record and creating a new one, which gets a new id. A
//! folder change alone is applied with a move and keeps the id.

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::{absent_ok, found, Reconcile};
use crate::core::constants::{LEVEL_REVOKE, LEVEL_UPDATE};
use crate::core::domain::{Credential, CredentialSpec};
use crate::core::remote::{NewResource, Remote, RemoteResource, RemoteResult, Share};
use crate::core::resolve::{present, Resolver};
use crate::core::types::{FolderId, GroupId};
use crate::error::{Action, Error, Kind, ResolveError, Result};

/// Reconciles credential records.
pub struct Credentials<'a, R: ?Sized> {
    remote: &'a R,
}

/// References of a desired record, resolved before any mutation.
struct Targets {
    folder_id: Option<FolderId>,
    group_id: Option<GroupId>,
}

impl<'a, R: Remote + ?Sized> Credentials<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    fn resolve(&self, desired: &CredentialSpec, token: &str) -> Result<Targets> {
        let resolver = Resolver::new(self.remote);
        let folder_id = resolver
            .folder(desired.folder.as_deref())
            .map_err(|e| Error::resolve(Kind::Credential, token, e))?;
        let group_id = resolver
            .group(desired.share_group.as_deref())
            .map_err(|e| Error::resolve(Kind::Credential, token, e))?;
        Ok(Targets { folder_id, group_id })
    }

    fn write(&self, desired: &CredentialSpec, targets: &Targets) -> RemoteResult<RemoteResource> {
        self.remote.create_resource(&NewResource {
            name: desired.name.clone(),
            username: desired.username.clone(),
            uri: desired.uri.clone(),
            description: desired.description.clone().unwrap_or_default(),
            folder_parent_id: targets.folder_id.clone(),
            secret: desired.secret.clone(),
        })
    }

    fn share(&self, id: &str, group_id: &str) -> Result<()> {
        self.remote
            .share_resource(id, &[Share::group(group_id, LEVEL_UPDATE)])
            .map_err(|e| Error::remote(Kind::Credential, id, Action::Share, e))?;
        info!(id, group = group_id, "shared credential");
        Ok(())
    }

    /// Delete `id` and create `desired` in its place.
    fn replace(&self, id: &str, desired: &CredentialSpec, targets: &Targets) -> Result<Credential> {
        absent_ok(
            Kind::Credential,
            id,
            Action::Delete,
            self.remote.delete_resource(id),
        )?;

        let created = self.write(desired, targets).map_err(|e| {
            warn!(id, error = %e, "credential deleted for replacement but re-create failed");
            Error::ReplaceIncomplete {
                kind: Kind::Credential,
                token: id.to_string(),
                cause: e.to_string(),
            }
        })?;

        if let Some(group_id) = &targets.group_id {
            self.share(&created.id, group_id)
                .map_err(|e| Error::partially_applied(Kind::Credential, id, &created.id, e))?;
        }

        info!(old = id, new = %created.id, "replaced credential");
        Ok(observe(created, Some(&desired.secret), desired.share_group.clone()))
    }
}

/// Build the observed model, keeping `known_secret` when the remote omits it.
pub(crate) fn observe(
    resource: RemoteResource,
    known_secret: Option<&Zeroizing<String>>,
    share_group: Option<String>,
) -> Credential {
    let secret = resource
        .secret
        .filter(|s| !s.is_empty())
        .or_else(|| known_secret.cloned());

    Credential {
        id: resource.id,
        name: resource.name,
        description: Some(resource.description).filter(|d| !d.is_empty()),
        username: resource.username,
        uri: resource.uri,
        secret,
        folder_id: resource.folder_parent_id.filter(|f| !f.is_empty()),
        share_group: share_group.filter(|g| !g.is_empty()),
    }
}

/// Whether any field without an in-place update primitive differs.
fn content_changed(desired: &CredentialSpec, prior: &Credential) -> bool {
    desired.name != prior.name
        || desired.username != prior.username
        || desired.uri != prior.uri
        || desired.description.as_deref().unwrap_or_default()
            != prior.description.as_deref().unwrap_or_default()
        // An unknown prior secret cannot be proven equal.
        || prior.secret.as_ref() != Some(&desired.secret)
}

impl<R: Remote + ?Sized> Reconcile for Credentials<'_, R> {
    type Desired = CredentialSpec;
    type Actual = Credential;

    const KIND: Kind = Kind::Credential;

    fn create(&self, desired: &CredentialSpec) -> Result<Credential> {
        let targets = self.resolve(desired, &desired.name)?;

        let created = self
            .write(desired, &targets)
            .map_err(|e| Error::remote(Self::KIND, &desired.name, Action::Create, e))?;
        info!(id = %created.id, name = %created.name, "created credential");

        if let Some(group_id) = &targets.group_id {
            self.share(&created.id, group_id)
                .map_err(|e| Error::partially_applied(Self::KIND, &desired.name, &created.id, e))?;
        }

        Ok(observe(created, Some(&desired.secret), desired.share_group.clone()))
    }

    fn read(&self, id: &str, prior: Option<&Credential>) -> Result<Option<Credential>> {
        let resource = found(Self::KIND, id, Action::Read, self.remote.get_resource(id))?;
        let Some(resource) = resource else {
            warn!(id, "credential removed out of band");
            return Ok(None);
        };

        if resource.secret.as_ref().map_or(true, |s| s.is_empty()) {
            debug!(id, "remote omitted secret, keeping last known value");
        }

        let known_secret = prior.and_then(|p| p.secret.as_ref());
        let share_group = prior.and_then(|p| p.share_group.clone());
        Ok(Some(observe(resource, known_secret, share_group)))
    }

    fn update(
        &self,
        id: &str,
        desired: &CredentialSpec,
        prior: &Credential,
    ) -> Result<Credential> {
        let targets = self.resolve(desired, id)?;

        // The previous share group is revoked when it changes; resolve it
        // now so no mutation happens before every reference is known.
        let stale_group = match present(prior.share_group.as_deref()) {
            Some(old) if desired.share_group.as_deref() != Some(old) => {
                match Resolver::new(self.remote).require_group(old) {
                    Ok(group_id) => Some(group_id),
                    Err(ResolveError::NotFound { .. }) => None,
                    Err(e) => return Err(Error::resolve(Self::KIND, id, e)),
                }
            }
            _ => None,
        };

        if content_changed(desired, prior) {
            return self.replace(id, desired, &targets);
        }

        let mut current = prior.clone();
        current.id = id.to_string();

        if targets.folder_id != prior.folder_id {
            self.remote
                .move_resource(id, targets.folder_id.as_deref())
                .map_err(|e| Error::remote(Self::KIND, id, Action::Move, e))?;
            info!(id, folder = ?targets.folder_id, "moved credential");
            current.folder_id = targets.folder_id.clone();
        }

        if let Some(old_group) = stale_group {
            self.remote
                .share_resource(id, &[Share::group(old_group.as_str(), LEVEL_REVOKE)])
                .map_err(|e| Error::remote(Self::KIND, id, Action::Share, e))?;
            info!(id, group = %old_group, "unshared credential");
        }

        if desired.share_group != prior.share_group {
            if let Some(group_id) = &targets.group_id {
                self.share(id, group_id)?;
            }
            current.share_group = desired.share_group.clone().filter(|g| !g.is_empty());
        }

        Ok(current)
    }

    fn delete(&self, id: &str) -> Result<()> {
        absent_ok(Self::KIND, id, Action::Delete, self.remote.delete_resource(id))?;
        info!(id, "deleted credential");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::remote::{Aro, Call, MemoryRemote};
    use crate::error::RemoteError;

    fn spec() -> CredentialSpec {
        CredentialSpec::new("db", "root", "postgres://db.internal", "hunter2")
    }

    #[test]
    fn test_create_keeps_secret() {
        let remote = MemoryRemote::new();
        let creds = Credentials::new(&remote);

        let created = creds.create(&spec()).unwrap();
        assert_eq!(created.secret.as_deref().map(String::as_str), Some("hunter2"));
        assert_eq!(created.folder_id, None);
        assert_eq!(created.description, None);
    }

    #[test]
    fn test_create_resolves_folder_and_group_before_write() {
        let remote = MemoryRemote::new();
        let folder = remote.seed_folder("Infra", None);
        remote.seed_group("ops", &[]);
        let creds = Credentials::new(&remote);

        let err = creds
            .create(&spec().in_folder("Infra").shared_with("nope"))
            .unwrap_err();
        assert!(matches!(err, Error::ReferenceNotFound { .. }));
        assert!(remote.mutations().is_empty());

        let created = creds
            .create(&spec().in_folder("Infra").shared_with("ops"))
            .unwrap();
        assert_eq!(created.folder_id, Some(folder.id));
        assert!(remote
            .resource_permissions(&created.id)
            .iter()
            .any(|p| p.aro == Aro::Group && p.level == LEVEL_UPDATE));
    }

    #[test]
    fn test_read_preserves_withheld_secret() {
        let remote = MemoryRemote::new();
        let creds = Credentials::new(&remote);
        let created = creds.create(&spec()).unwrap();

        remote.withhold_secrets(true);
        let read = creds.read(&created.id, Some(&created)).unwrap().unwrap();
        assert_eq!(read.secret.as_deref().map(String::as_str), Some("hunter2"));

        let blind = creds.read(&created.id, None).unwrap().unwrap();
        assert!(blind.secret.is_none());
    }

    #[test]
    fn test_update_unchanged_issues_no_mutation() {
        let remote = MemoryRemote::new();
        let creds = Credentials::new(&remote);
        let created = creds.create(&spec()).unwrap();
        remote.reset_calls();

        let updated = creds.update(&created.id, &spec(), &created).unwrap();
        assert_eq!(updated.id, created.id);
        assert!(remote.mutations().is_empty());
    }

    #[test]
    fn test_update_content_replaces_with_new_id() {
        let remote = MemoryRemote::new();
        let creds = Credentials::new(&remote);
        let created = creds.create(&spec()).unwrap();

        let mut changed = spec();
        changed.secret = Zeroizing::new("correct horse".to_string());
        let updated = creds.update(&created.id, &changed, &created).unwrap();

        assert_ne!(updated.id, created.id);
        assert!(remote.resource(&created.id).is_none());
        assert_eq!(
            remote.resource(&updated.id).unwrap().secret.unwrap().as_str(),
            "correct horse"
        );
    }

    #[test]
    fn test_update_folder_only_moves_in_place() {
        let remote = MemoryRemote::new();
        let folder = remote.seed_folder("Infra", None);
        let creds = Credentials::new(&remote);
        let created = creds.create(&spec()).unwrap();
        remote.reset_calls();

        let updated = creds
            .update(&created.id, &spec().in_folder("Infra"), &created)
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.folder_id, Some(folder.id));
        assert_eq!(remote.mutations(), vec![Call::MoveResource]);
    }

    #[test]
    fn test_failed_recreate_reports_incomplete_replace() {
        let remote = MemoryRemote::new();
        let creds = Credentials::new(&remote);
        let created = creds.create(&spec()).unwrap();
        remote.fail_on(
            Call::CreateResource,
            RemoteError::Rejected("quota exceeded".to_string()),
        );

        let mut changed = spec();
        changed.uri = "postgres://db2.internal".to_string();
        let err = creds.update(&created.id, &changed, &created).unwrap_err();

        assert!(matches!(err, Error::ReplaceIncomplete { .. }));
        let msg = err.to_string();
        assert!(msg.contains(&created.id));
        assert!(msg.contains("quota exceeded"));
        assert!(remote.resource(&created.id).is_none());
    }

    #[test]
    fn test_share_failure_after_create_reports_new_id() {
        let remote = MemoryRemote::new();
        remote.seed_group("ops", &[]);
        let creds = Credentials::new(&remote);
        remote.fail_on(
            Call::ShareResource,
            RemoteError::Unavailable("gateway timeout".to_string()),
        );

        let err = creds.create(&spec().shared_with("ops")).unwrap_err();

        assert!(matches!(err, Error::PartiallyApplied { .. }));
        let new_id = err.new_id().unwrap();
        assert!(remote.resource(new_id).is_some());
        assert!(err.to_string().contains("gateway timeout"));
    }

    #[test]
    fn test_share_failure_after_replace_reports_new_id() {
        let remote = MemoryRemote::new();
        remote.seed_group("ops", &[]);
        let creds = Credentials::new(&remote);
        let created = creds.create(&spec().shared_with("ops")).unwrap();
        remote.fail_on(
            Call::ShareResource,
            RemoteError::Unavailable("gateway timeout".to_string()),
        );

        let mut changed = spec().shared_with("ops");
        changed.username = "admin".to_string();
        let err = creds.update(&created.id, &changed, &created).unwrap_err();

        match &err {
            Error::PartiallyApplied { token, new_id, .. } => {
                assert_eq!(token, &created.id);
                assert_ne!(new_id, &created.id);
                assert_eq!(remote.resource(new_id).unwrap().username, "admin");
            }
            other => panic!("expected PartiallyApplied, got {:?}", other),
        }
        assert!(remote.resource(&created.id).is_none());
        assert_eq!(remote.count(Call::CreateResource), 2);
    }

    #[test]
    fn test_changing_share_group_revokes_previous() {
        let remote = MemoryRemote::new();
        let ops = remote.seed_group("ops", &[]);
        let dev = remote.seed_group("dev", &[]);
        let creds = Credentials::new(&remote);
        let created = creds.create(&spec().shared_with("ops")).unwrap();

        let updated = creds
            .update(&created.id, &spec().shared_with("dev"), &created)
            .unwrap();
        assert_eq!(updated.share_group.as_deref(), Some("dev"));

        let perms = remote.resource_permissions(&created.id);
        assert!(!perms.iter().any(|p| p.aro_foreign_key == ops.id));
        assert!(perms.iter().any(|p| p.aro_foreign_key == dev.id));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let remote = MemoryRemote::new();
        let creds = Credentials::new(&remote);
        let created = creds.create(&spec()).unwrap();

        creds.delete(&created.id).unwrap();
        creds.delete(&created.id).unwrap();
        assert!(creds.read(&created.id, Some(&created)).unwrap().is_none());
    }
}
