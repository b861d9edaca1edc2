//! Latchkey - declarative reconciliation for a shared secret vault.
//!
//! Callers declare folders, credential records, groups, users and folder
//! grants; latchkey turns each declaration into the minimal set of calls
//! against the remote vault and reports what it observed.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── error             # Error taxonomy
//! ├── logging           # tracing subscriber setup
//! └── core/
//!     ├── config        # provider.toml + PASSBOLT_* fallback
//!     ├── constants     # Levels, env vars, delimiters
//!     ├── domain/       # Desired (*Spec) and observed models
//!     ├── permission    # Symbolic level <-> numeric level codec
//!     ├── resolve       # Name -> id resolution
//!     ├── membership    # Group membership diff
//!     ├── remote/       # Remote client trait
//!     │   ├── mod       # Remote trait and wire models
//!     │   └── memory    # In-memory vault with call recording
//!     ├── reconcile/    # Per-kind Create/Read/Update/Delete
//!     ├── lookup        # Read-only queries
//!     └── provider      # Entry point and kind dispatch
//! ```
//!
//! # Example
//!
//! ```
//! use latchkey::{FolderSpec, MemoryRemote, Provider, Reconcile};
//!
//! let provider = Provider::new(MemoryRemote::new());
//! let folder = provider.folders().create(&FolderSpec::new("Infra")).unwrap();
//! let seen = provider.folders().read(&folder.id, Some(&folder)).unwrap();
//! assert_eq!(seen, Some(folder));
//! ```

pub mod core;
pub mod error;
pub mod logging;

pub use crate::core::config::ProviderConfig;
pub use crate::core::domain::{
    Actual, Credential, CredentialSpec, Desired, Folder, FolderInfo, FolderSpec, Grant, GrantId,
    GrantSpec, Group, GroupSpec, User, UserSpec,
};
pub use crate::core::membership::Member;
pub use crate::core::permission::Permission;
pub use crate::core::provider::Provider;
pub use crate::core::reconcile::Reconcile;
pub use crate::core::remote::{Call, MemoryRemote, Remote};
pub use crate::error::{Error, Kind, RemoteError, Result};
