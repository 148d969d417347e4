//! Logging setup for the binary

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `fmt` output filtered by `RUST_LOG`, `info` when unset or unparsable
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
