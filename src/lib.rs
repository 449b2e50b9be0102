//! # machina
//!
//! Command dispatch and target resolution for a CLI that manages named
//! machines, each operated by a provider backend.
//!
//! ## Features
//!
//! - Splitting argv into global flags, subcommand and subcommand arguments
//! - Subcommand option parsing with help short-circuiting
//! - Resolving which (machine, provider) pairs a subcommand acts on
//! - IPv4 network address arithmetic
//!
//! ## Example
//!
//! ```
//! use machina::core::{ResolutionOptions, with_target_vms};
//! use machina::environment::StaticEnvironment;
//! use machina::error::MachinaError;
//!
//! let env = StaticEnvironment::new()
//!     .with_machines(["web", "db"])
//!     .with_active("db", "docker");
//!
//! let mut targets = Vec::new();
//! with_target_vms(&env, None, &ResolutionOptions::new(), |machine| {
//!     targets.push(format!("{}:{}", machine.name, machine.provider));
//!     Ok::<(), MachinaError>(())
//! })?;
//!
//! assert_eq!(targets, ["web:virtualbox", "db:docker"]);
//! # Ok::<(), MachinaError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod environment;
pub mod error;
pub mod ui;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with appropriate verbosity
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
