//! Error types for latchkey.
//!
//! Leaf components return their own focused errors (`PermissionError`,
//! `ResolveError`, `RemoteError`, `ConfigError`). Reconcilers lift them into
//! [`Error`] together with the entity kind and identifying token, so every
//! surfaced failure says what was being reconciled and why it failed.

use std::fmt;
use thiserror::Error;

use crate::core::constants::PERMISSION_SYMBOLS;

/// The kind of remote entity a reconciler manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Folder,
    Credential,
    Group,
    User,
    FolderPermission,
}

impl Kind {
    /// Lower-case display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Credential => "credential",
            Self::Group => "group",
            Self::User => "user",
            Self::FolderPermission => "folder permission",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The remote call that was in flight when a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Move,
    Share,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Move => "move",
            Self::Share => "share",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The kind of name-based reference the resolver looks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Folder,
    Group,
    User,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Folder => "folder",
            Self::Group => "group",
            Self::User => "user",
        };
        f.write_str(name)
    }
}

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A named folder, group or user could not be resolved.
    #[error("{kind} '{token}': {reference} '{name}' not found")]
    ReferenceNotFound {
        kind: Kind,
        token: String,
        reference: Reference,
        name: String,
    },

    /// A symbolic permission level outside the recognized set.
    #[error("{kind} '{token}': {source}")]
    InvalidPermission {
        kind: Kind,
        token: String,
        #[source]
        source: PermissionError,
    },

    /// The remote system refused a call.
    #[error("{kind} '{token}': remote rejected {action}: {cause}")]
    RemoteRejected {
        kind: Kind,
        token: String,
        action: Action,
        cause: String,
    },

    /// Transport or authentication failure.
    #[error("{kind} '{token}': remote unavailable during {action}: {cause}")]
    RemoteUnavailable {
        kind: Kind,
        token: String,
        action: Action,
        cause: String,
    },

    /// The underlying call was cancelled.
    #[error("{kind} '{token}': {action} cancelled: {cause}")]
    Cancelled {
        kind: Kind,
        token: String,
        action: Action,
        cause: String,
    },

    /// Update-as-replace deleted the old record but could not create the new one.
    ///
    /// The entity is absent remotely; the caller should forget `token` and
    /// create again.
    #[error(
        "{kind} '{token}': deleted for replacement but re-create failed, \
         entity is now absent remotely: {cause}"
    )]
    ReplaceIncomplete {
        kind: Kind,
        token: String,
        cause: String,
    },

    /// A mutation went through but a follow-up step failed.
    ///
    /// The entity exists remotely as `new_id`, which may differ from
    /// `token`. The caller should track `new_id` and retry the update
    /// instead of creating again.
    #[error("{kind} '{token}': applied as '{new_id}' but a follow-up step failed: {cause}")]
    PartiallyApplied {
        kind: Kind,
        token: String,
        new_id: String,
        cause: String,
    },

    /// Group members must be unique by user id.
    #[error("{kind} '{token}': user '{user_id}' is listed more than once")]
    DuplicateMember {
        kind: Kind,
        token: String,
        user_id: String,
    },

    /// A field the remote system cannot change after creation.
    #[error(
        "{kind} '{token}': {field} cannot be changed after creation \
         (have '{current}', want '{desired}')"
    )]
    ImmutableField {
        kind: Kind,
        token: String,
        field: &'static str,
        current: String,
        desired: String,
    },

    /// A composite import identifier that does not have the expected shape.
    #[error("{kind} '{id}': invalid import id, expected <folder_id>:<group_name>")]
    InvalidImportId { kind: Kind, id: String },

    /// Desired state and prior state describe different entity kinds.
    #[error("kind mismatch: desired {desired}, prior {prior}")]
    KindMismatch { desired: Kind, prior: Kind },

    /// The authenticated client could not be established.
    #[error("unable to connect to {url}: {cause}")]
    Connect { url: String, cause: String },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Lift a remote failure into the taxonomy.
    ///
    /// `NotFound` during a mutation means the remote refused it, so it maps
    /// to `RemoteRejected`. Read and delete paths handle `NotFound` before
    /// reaching here.
    pub fn remote(kind: Kind, token: impl Into<String>, action: Action, err: RemoteError) -> Self {
        let token = token.into();
        match err {
            RemoteError::NotFound(cause) | RemoteError::Rejected(cause) => Self::RemoteRejected {
                kind,
                token,
                action,
                cause,
            },
            RemoteError::Unavailable(cause) => Self::RemoteUnavailable {
                kind,
                token,
                action,
                cause,
            },
            RemoteError::Cancelled(cause) => Self::Cancelled {
                kind,
                token,
                action,
                cause,
            },
        }
    }

    /// Wrap the failure of a step that ran after `new_id` was written.
    pub fn partially_applied(
        kind: Kind,
        token: impl Into<String>,
        new_id: impl Into<String>,
        err: Error,
    ) -> Self {
        Self::PartiallyApplied {
            kind,
            token: token.into(),
            new_id: new_id.into(),
            cause: err.to_string(),
        }
    }

    /// The id an entity now has remotely after a partial failure.
    pub fn new_id(&self) -> Option<&str> {
        match self {
            Self::PartiallyApplied { new_id, .. } => Some(new_id),
            _ => None,
        }
    }

    /// Lift a resolver failure into the taxonomy.
    pub fn resolve(kind: Kind, token: impl Into<String>, err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { reference, token: name } => Self::ReferenceNotFound {
                kind,
                token: token.into(),
                reference,
                name,
            },
            ResolveError::Remote(err) => Self::remote(kind, token, Action::List, err),
        }
    }

    /// Lift a codec failure into the taxonomy.
    pub fn permission(kind: Kind, token: impl Into<String>, err: PermissionError) -> Self {
        Self::InvalidPermission {
            kind,
            token: token.into(),
            source: err,
        }
    }

    /// Whether this is a validation-class failure raised before any remote mutation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ReferenceNotFound { .. }
                | Self::InvalidPermission { .. }
                | Self::ImmutableField { .. }
                | Self::DuplicateMember { .. }
                | Self::InvalidImportId { .. }
                | Self::KindMismatch { .. }
        )
    }
}

/// Errors returned by the remote authenticated client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl RemoteError {
    /// Whether the remote reports the entity as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors from the permission codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error(
        "invalid permission '{value}': must be one of {accepted}",
        accepted = PERMISSION_SYMBOLS.join(", ")
    )]
    Invalid { value: String },
}

/// Errors from the reference resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{reference} '{token}' not found")]
    NotFound { reference: Reference, token: String },

    #[error("listing candidates failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no {field} value was provided in configuration or environment variable {env}")]
    Missing {
        field: &'static str,
        env: &'static str,
    },

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_not_found_in_mutation_is_rejected() {
        let err = Error::remote(
            Kind::Folder,
            "f-1",
            Action::Update,
            RemoteError::NotFound("The folder does not exist.".to_string()),
        );
        assert!(matches!(err, Error::RemoteRejected { .. }));
        let msg = err.to_string();
        assert!(msg.contains("folder"));
        assert!(msg.contains("f-1"));
        assert!(msg.contains("The folder does not exist."));
    }

    #[test]
    fn test_remote_unavailable_keeps_cause() {
        let err = Error::remote(
            Kind::User,
            "alice@example.com",
            Action::List,
            RemoteError::Unavailable("connection reset".to_string()),
        );
        assert!(matches!(err, Error::RemoteUnavailable { .. }));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_cancelled_is_not_swallowed() {
        let err = Error::remote(
            Kind::Group,
            "ops",
            Action::Create,
            RemoteError::Cancelled("deadline exceeded".to_string()),
        );
        assert!(matches!(err, Error::Cancelled { .. }));
    }

    #[test]
    fn test_resolve_not_found_names_reference() {
        let err = Error::resolve(
            Kind::Credential,
            "db-password",
            ResolveError::NotFound {
                reference: Reference::Folder,
                token: "Infra".to_string(),
            },
        );
        assert!(err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("credential 'db-password'"));
        assert!(msg.contains("folder 'Infra' not found"));
    }

    #[test]
    fn test_permission_error_lists_accepted_values() {
        let err = PermissionError::Invalid {
            value: "bogus".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("bogus"));
        assert!(msg.contains("read, update, owner, delete"));
    }

    #[test]
    fn test_partially_applied_exposes_new_id() {
        let cause = Error::remote(
            Kind::Credential,
            "r-2",
            Action::Share,
            RemoteError::Unavailable("gateway timeout".to_string()),
        );
        let err = Error::partially_applied(Kind::Credential, "r-1", "r-2", cause);

        assert_eq!(err.new_id(), Some("r-2"));
        assert!(!err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("credential 'r-1'"));
        assert!(msg.contains("gateway timeout"));
    }

    #[test]
    fn test_import_id_error_names_kind() {
        let err = Error::InvalidImportId {
            kind: Kind::FolderPermission,
            id: "no-delimiter".to_string(),
        };
        assert!(err.to_string().starts_with("folder permission 'no-delimiter'"));
        assert_eq!(err.new_id(), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::FolderPermission.to_string(), "folder permission");
        assert_eq!(Kind::Credential.to_string(), "credential");
    }
}
