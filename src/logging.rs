//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber for crew progress output
///
/// `RUST_LOG` wins when set; otherwise `info` when verbose and `warn` when not.
/// Returns `false` if a global subscriber was already installed.
pub fn init(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
