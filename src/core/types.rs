//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A folder identifier assigned by the remote system.
pub type FolderId = String;

/// A credential record identifier assigned by the remote system.
///
/// Changes when an update has to replace the record.
pub type ResourceId = String;

/// A group identifier assigned by the remote system.
pub type GroupId = String;

/// A user identifier assigned by the remote system.
///
/// Immutable once the user exists.
pub type UserId = String;

/// A human-readable reference that may be a name or an identifier.
pub type NameOrId = String;
