//! User account reconciliation.
//!
//! Users are looked up by username, which the remote never lets change.
//! Role and names are overwritten as a whole whenever any of them drifts.

use tracing::{debug, info, warn};

use super::{absent_ok, Reconcile};
use crate::core::domain::{User, UserSpec};
use crate::core::remote::{NewUser, Remote};
use crate::error::{Action, Error, Kind, Result};

/// Reconciles user accounts.
pub struct Users<'a, R: ?Sized> {
    remote: &'a R,
}

impl<'a, R: Remote + ?Sized> Users<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }
}

fn unchanged(desired: &UserSpec, prior: &User) -> bool {
    desired.role == prior.role
        && desired.first_name == prior.first_name
        && desired.last_name == prior.last_name
}

impl<R: Remote + ?Sized> Reconcile for Users<'_, R> {
    type Desired = UserSpec;
    type Actual = User;

    const KIND: Kind = Kind::User;

    fn create(&self, desired: &UserSpec) -> Result<User> {
        let created = self
            .remote
            .create_user(&NewUser {
                username: desired.username.clone(),
                first_name: desired.first_name.clone(),
                last_name: desired.last_name.clone(),
                role: desired.role.clone(),
            })
            .map_err(|e| Error::remote(Self::KIND, &desired.username, Action::Create, e))?;

        info!(id = %created.id, username = %created.username, role = %created.role, "created user");
        Ok(User::from(created))
    }

    fn read(&self, id: &str, _prior: Option<&User>) -> Result<Option<User>> {
        let users = self
            .remote
            .list_users(None)
            .map_err(|e| Error::remote(Self::KIND, id, Action::List, e))?;

        match users.into_iter().find(|u| u.id == id) {
            Some(user) => {
                debug!(id, username = %user.username, "read user");
                Ok(Some(User::from(user)))
            }
            None => {
                warn!(id, "user removed out of band");
                Ok(None)
            }
        }
    }

    fn update(&self, id: &str, desired: &UserSpec, prior: &User) -> Result<User> {
        if desired.username != prior.username {
            return Err(Error::ImmutableField {
                kind: Self::KIND,
                token: id.to_string(),
                field: "username",
                current: prior.username.clone(),
                desired: desired.username.clone(),
            });
        }

        if unchanged(desired, prior) {
            debug!(id, "user already converged");
            let mut current = prior.clone();
            current.id = id.to_string();
            return Ok(current);
        }

        let updated = self
            .remote
            .update_user(id, &desired.role, &desired.first_name, &desired.last_name)
            .map_err(|e| Error::remote(Self::KIND, id, Action::Update, e))?;

        info!(id, username = %updated.username, role = %updated.role, "updated user");
        Ok(User::from(updated))
    }

    fn delete(&self, id: &str) -> Result<()> {
        absent_ok(Self::KIND, id, Action::Delete, self.remote.delete_user(id))?;
        info!(id, "deleted user");
        Ok(())
    }
}
