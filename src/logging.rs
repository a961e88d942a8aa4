//! Diagnostic logging setup
//!
//! Library code only emits `tracing` events; the binary installs a subscriber
//! once at startup. `RUST_LOG` takes precedence over the configured directive.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Directive used when neither `RUST_LOG` nor the settings provide one
pub const DEFAULT_LOG_FILTER: &str = "tally=warn";

/// Install the global stderr subscriber
///
/// `default_directive` applies when `RUST_LOG` is unset or invalid. Calling
/// this more than once is harmless.
pub fn init_tracing(default_directive: &str) {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directive))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        // Another subscriber may already be installed (e.g. by a test harness)
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
