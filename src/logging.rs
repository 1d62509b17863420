//! Console logging setup
//!
//! Diagnostics go to stderr through `tracing`, leaving stdout for the
//! metrics report. The default level is `info` (`debug` when verbose) and
//! `RUST_LOG` overrides either.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
        tracing::info!("logging initialized");
    }
}
