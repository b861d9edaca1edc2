//! Per-kind reconcilers.
//!
//! Each reconciler borrows the remote client and turns desired state into
//! the minimal remote calls. The lifecycle is the same for every kind:
//!
//! ```text
//! Absent -> Created -> {Observed, Drifted} -> Updated -> Observed
//! Observed | Drifted -> Deleted -> Absent
//! ```
//!
//! Drift is detected by the caller comparing a fresh `read` with what it
//! declared; reconcilers only answer requests.
//!
//! Shared rules:
//! - References are resolved and permission symbols encoded before the first
//!   mutation, so validation failures never leave partial writes.
//! - `read` returning `None` means the entity was removed out of band.
//! - `delete` of an already-absent entity succeeds.
//! - Remote failures are propagated, never retried.

mod credential;
mod folder;
mod grant;
mod group;
mod user;

use crate::error::{Action, Error, Kind, RemoteError, Result};

pub(crate) use credential::observe as observe_credential;
pub use credential::Credentials;
pub use folder::Folders;
pub use grant::FolderPermissions;
pub use group::Groups;
pub use user::Users;

/// Create/Read/Update/Delete against the remote system for one entity kind.
pub trait Reconcile {
    /// Desired state, as declared by the caller.
    type Desired;

    /// Observed state, as reported by the remote.
    type Actual;

    /// Entity kind managed by this reconciler.
    const KIND: Kind;

    /// Create the entity.
    ///
    /// # Returns
    ///
    /// The observed state right after creation, including the new id.
    fn create(&self, desired: &Self::Desired) -> Result<Self::Actual>;

    /// Fetch the entity by id.
    ///
    /// `prior` is the last observed state, used to carry forward values the
    /// remote does not return.
    ///
    /// # Returns
    ///
    /// `None` when the entity no longer exists remotely.
    fn read(&self, id: &str, prior: Option<&Self::Actual>) -> Result<Option<Self::Actual>>;

    /// Converge the entity onto `desired`.
    ///
    /// # Returns
    ///
    /// The new observed state. Its id is authoritative and may differ from
    /// `id` when the kind can only be updated by replacement.
    fn update(&self, id: &str, desired: &Self::Desired, prior: &Self::Actual)
        -> Result<Self::Actual>;

    /// Remove the entity. Already absent is success.
    fn delete(&self, id: &str) -> Result<()>;
}

/// Treat a remote `NotFound` as "already gone".
pub(crate) fn absent_ok(
    kind: Kind,
    token: &str,
    action: Action,
    result: std::result::Result<(), RemoteError>,
) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            tracing::debug!(%kind, token, "already absent");
            Ok(())
        }
        Err(e) => Err(Error::remote(kind, token, action, e)),
    }
}

/// Treat a remote `NotFound` as an empty observation.
pub(crate) fn found<T>(
    kind: Kind,
    token: &str,
    action: Action,
    result: std::result::Result<T, RemoteError>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(Error::remote(kind, token, action, e)),
    }
}
