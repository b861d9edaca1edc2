//! User models.

use serde::{Deserialize, Serialize};

use crate::core::remote::RemoteUser;
use crate::core::types::UserId;

/// Desired shape of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    /// Stable lookup key; cannot change once the user exists.
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// Observed state of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl From<RemoteUser> for User {
    fn from(u: RemoteUser) -> Self {
        Self {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
        }
    }
}
