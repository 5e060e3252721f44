//! Diagnostic logging setup.
//!
//! Library code logs through `tracing` macros; the binary installs a
//! `fmt` subscriber writing to stderr so it never mixes with command
//! output on stdout.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "pocketvault=warn";

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "pocketvault=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbose`.  Calling this twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
