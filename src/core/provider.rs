//! Orchestrator-facing entry point.
//!
//! [`Provider`] owns the authenticated client and hands out per-kind
//! reconcilers. It also dispatches over the [`Desired`] and [`Actual`]
//! enums so an orchestrator holding heterogeneous state can drive every
//! kind through four calls.

use tracing::{debug, info};

use crate::core::config::ProviderConfig;
use crate::core::domain::{Actual, Desired};
use crate::core::lookup::Lookup;
use crate::core::reconcile::{Credentials, FolderPermissions, Folders, Groups, Reconcile, Users};
use crate::core::remote::{Remote, RemoteResult};
use crate::error::{Error, Kind, Result};

/// Reconciliation entry point over a remote client.
#[derive(Debug)]
pub struct Provider<R> {
    remote: R,
}

/// Narrow an `Actual` to the variant for `$kind`, or fail with a mismatch.
macro_rules! expect_kind {
    ($actual:expr, $variant:ident, $kind:expr) => {
        match $actual {
            Actual::$variant(inner) => inner,
            other => {
                return Err(Error::KindMismatch {
                    desired: $kind,
                    prior: other.kind(),
                })
            }
        }
    };
}

/// Like `expect_kind!` for an optional prior observation.
macro_rules! expect_prior {
    ($prior:expr, $variant:ident, $kind:expr) => {
        match $prior {
            None => None,
            Some(actual) => Some(expect_kind!(actual, $variant, $kind)),
        }
    };
}

impl<R: Remote> Provider<R> {
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    /// Establish the authenticated client and wrap it.
    ///
    /// Session establishment itself (key exchange, login) belongs to
    /// `connector`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connect` with the base URL and the connector's cause.
    pub fn connect<F>(config: &ProviderConfig, connector: F) -> Result<Self>
    where
        F: FnOnce(&ProviderConfig) -> RemoteResult<R>,
    {
        debug!(base_url = %config.base_url, "connecting");
        let remote = connector(config).map_err(|e| Error::Connect {
            url: config.base_url.clone(),
            cause: e.to_string(),
        })?;
        info!(base_url = %config.base_url, "connected");
        Ok(Self::new(remote))
    }

    /// The underlying client.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn folders(&self) -> Folders<'_, R> {
        Folders::new(&self.remote)
    }

    pub fn credentials(&self) -> Credentials<'_, R> {
        Credentials::new(&self.remote)
    }

    pub fn groups(&self) -> Groups<'_, R> {
        Groups::new(&self.remote)
    }

    pub fn users(&self) -> Users<'_, R> {
        Users::new(&self.remote)
    }

    pub fn folder_permissions(&self) -> FolderPermissions<'_, R> {
        FolderPermissions::new(&self.remote)
    }

    /// Read-only queries.
    pub fn lookup(&self) -> Lookup<'_, R> {
        Lookup::new(&self.remote)
    }

    pub fn create(&self, desired: &Desired) -> Result<Actual> {
        Ok(match desired {
            Desired::Folder(d) => Actual::Folder(self.folders().create(d)?),
            Desired::Credential(d) => Actual::Credential(self.credentials().create(d)?),
            Desired::Group(d) => Actual::Group(self.groups().create(d)?),
            Desired::User(d) => Actual::User(self.users().create(d)?),
            Desired::FolderPermission(d) => {
                Actual::FolderPermission(self.folder_permissions().create(d)?)
            }
        })
    }

    /// Read an entity of `kind`. `None` means it is gone remotely.
    ///
    /// # Errors
    ///
    /// Returns `Error::KindMismatch` if `prior` is of another kind.
    pub fn read(&self, kind: Kind, id: &str, prior: Option<&Actual>) -> Result<Option<Actual>> {
        Ok(match kind {
            Kind::Folder => {
                let prior = expect_prior!(prior, Folder, kind);
                self.folders().read(id, prior)?.map(Actual::Folder)
            }
            Kind::Credential => {
                let prior = expect_prior!(prior, Credential, kind);
                self.credentials().read(id, prior)?.map(Actual::Credential)
            }
            Kind::Group => {
                let prior = expect_prior!(prior, Group, kind);
                self.groups().read(id, prior)?.map(Actual::Group)
            }
            Kind::User => {
                let prior = expect_prior!(prior, User, kind);
                self.users().read(id, prior)?.map(Actual::User)
            }
            Kind::FolderPermission => {
                let prior = expect_prior!(prior, FolderPermission, kind);
                self.folder_permissions().read(id, prior)?.map(Actual::FolderPermission)
            }
        })
    }

    /// Converge `id` onto `desired`. The returned id is authoritative.
    ///
    /// # Errors
    ///
    /// Returns `Error::KindMismatch` if `desired` and `prior` disagree on kind.
    pub fn update(&self, id: &str, desired: &Desired, prior: &Actual) -> Result<Actual> {
        let kind = desired.kind();
        Ok(match desired {
            Desired::Folder(d) => {
                let p = expect_kind!(prior, Folder, kind);
                Actual::Folder(self.folders().update(id, d, p)?)
            }
            Desired::Credential(d) => {
                let p = expect_kind!(prior, Credential, kind);
                Actual::Credential(self.credentials().update(id, d, p)?)
            }
            Desired::Group(d) => {
                let p = expect_kind!(prior, Group, kind);
                Actual::Group(self.groups().update(id, d, p)?)
            }
            Desired::User(d) => {
                let p = expect_kind!(prior, User, kind);
                Actual::User(self.users().update(id, d, p)?)
            }
            Desired::FolderPermission(d) => {
                let p = expect_kind!(prior, FolderPermission, kind);
                Actual::FolderPermission(self.folder_permissions().update(id, d, p)?)
            }
        })
    }

    pub fn delete(&self, kind: Kind, id: &str) -> Result<()> {
        match kind {
            Kind::Folder => self.folders().delete(id),
            Kind::Credential => self.credentials().delete(id),
            Kind::Group => self.groups().delete(id),
            Kind::User => self.users().delete(id),
            Kind::FolderPermission => self.folder_permissions().delete(id),
        }
    }
}
