//! Command-line interface module
//!
//! Splits raw arguments, reads global flags and dispatches to the built-in
//! subcommands.

pub mod args;
pub mod commands;

pub use args::{GlobalArgs, ParsedInvocation, split_main_and_subcommand};
pub use commands::execute_command;
