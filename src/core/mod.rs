//! Core command machinery
//!
//! Option parsing, target resolution and the [`Command`] that ties them
//! together for a subcommand handler.

pub mod command;
pub mod options;
pub mod resolver;

pub use command::Command;
pub use options::{OptionParser, parse_options};
pub use resolver::{ResolutionOptions, TargetResolver, Targets, with_target_vms};
