//! Subscriber setup for the `repo-clusters` binary.
//!
//! `RUST_LOG` always wins over the verbosity flags.
//! Example: `RUST_LOG=repo_clusters::algo=debug repo-clusters cluster ...`

use tracing_subscriber::{fmt, EnvFilter};

/// Default level for a `-v` count, or `error` when quiet.
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install a stderr subscriber. A second call is a no-op.
pub fn init_logging(verbose: u8, quiet: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose, quiet)));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
