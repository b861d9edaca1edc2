//! Tracing subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::constants::ENV_LOG;

/// Directive used when `LATCHKEY_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "latchkey=debug"
    } else {
        "latchkey=warn"
    }
}

/// Install a global subscriber filtered by `LATCHKEY_LOG`.
///
/// Returns `false` when a subscriber was already installed, which is the
/// normal case for an embedding orchestrator that set up its own.
pub fn init(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "latchkey=debug");
        assert_eq!(default_directive(false), "latchkey=warn");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        assert!(!init(true));
    }
}
