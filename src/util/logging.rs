//! Logging setup and diagnostic helpers.
//!
//! The library only emits `tracing` events. Applications and tests call
//! [`init_tracing`] (or install their own subscriber) to see them.
//!
//! Targets used by the crate:
//! - `scene_index::coding_error` - invariant violations, see [`coding_error!`](crate::coding_error)
//! - `scene_index::velocity_motion` - per-primvar velocity motion decisions
//! - `scene_index::notices` - observer notice traffic
//! - `scene_index::legacy` - legacy delegate emulation

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "SCENE_INDEX_LOG";

/// Install a global fmt subscriber.
///
/// The filter comes from `SCENE_INDEX_LOG`, then `RUST_LOG`, then `warn`.
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .is_ok()
}

/// Report a violated invariant and continue.
///
/// Logs at error level on the `scene_index::coding_error` target. Callers
/// follow up with a safe fallback such as treating the value as absent.
#[macro_export]
macro_rules! coding_error {
    ($($arg:tt)*) => {
        ::tracing::error!(target: "scene_index::coding_error", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        let _ = init_tracing();
        // A second install never panics.
        assert!(!init_tracing());
        crate::coding_error!("exercised from test {}", 1);
    }
}
