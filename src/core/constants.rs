//! Constants used throughout latchkey.
//!
//! Centralizes magic strings, environment variables and remote access levels.

/// Environment variable consulted when `base_url` is absent from config.
pub const ENV_URL: &str = "PASSBOLT_URL";

/// Environment variable consulted when `private_key` is absent from config.
pub const ENV_KEY: &str = "PASSBOLT_KEY";

/// Environment variable consulted when `passphrase` is absent from config.
pub const ENV_PASS: &str = "PASSBOLT_PASS";

/// Environment variable holding a tracing filter directive.
pub const ENV_LOG: &str = "LATCHKEY_LOG";

/// Provider config file name inside the latchkey config directory.
pub const CONFIG_FILE: &str = "provider.toml";

/// Config directory name under the platform config dir.
pub const CONFIG_DIR: &str = "latchkey";

/// Remote access level for read-only access.
pub const LEVEL_READ: i32 = 1;

/// Remote access level for read and edit access.
pub const LEVEL_UPDATE: i32 = 7;

/// Remote access level for full control.
pub const LEVEL_OWNER: i32 = 15;

/// Sentinel level that revokes every level for a grantee.
pub const LEVEL_REVOKE: i32 = -1;

/// Accepted permission symbols, in display order.
pub const PERMISSION_SYMBOLS: &[&str] = &["read", "update", "owner", "delete"];

/// Symbol reported for a remote level the codec does not recognize.
pub const UNKNOWN_SYMBOL: &str = "unknown";

/// Delimiter between folder id and group name in a grant identifier.
pub const GRANT_ID_DELIMITER: char = ':';
