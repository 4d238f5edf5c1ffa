//! Logging setup for the CLI
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use tracing_subscriber::EnvFilter;

/// Initialize tracing output on stderr
///
/// `RUST_LOG` wins when set; otherwise verbosity flags pick the level.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
