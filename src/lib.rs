//! Identifier rename suggestions for decompiled .NET programs
//!
//! A locally hosted Ollama model proposes readable names for obfuscated
//! types, members, parameters and locals. Suggestions are reviewed and then
//! written back into the program model, one entity at a time or in batches
//! from a whole-module analysis.

pub mod ai;
pub mod commands;
pub mod config;
pub mod model;
pub mod refactor;
pub mod session;
pub mod utils;

use tracing_subscriber::{fmt, EnvFilter};

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "decomp_rename=info";

/// Install the stderr log subscriber; a second call is a no-op
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
