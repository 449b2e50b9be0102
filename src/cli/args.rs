//! Top-level argument splitting and global flags

use crate::error::{MachinaError, Result};
use clap::Parser;

/// Raw argv split into global flags, subcommand and subcommand arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInvocation {
    pub main_args: Vec<String>,
    pub subcommand: Option<String>,
    pub subcommand_args: Vec<String>,
}

/// Split `args` at the first token that does not start with `-`.
///
/// Leading flags become `main_args`, the first non-flag token is the
/// subcommand and everything after it is passed through untouched.
pub fn split_main_and_subcommand<I, S>(args: I) -> ParsedInvocation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut invocation = ParsedInvocation::default();
    let mut args = args.into_iter().map(Into::into);

    for arg in args.by_ref() {
        if arg.starts_with('-') {
            invocation.main_args.push(arg);
        } else {
            invocation.subcommand = Some(arg);
            break;
        }
    }
    invocation.subcommand_args = args.collect();

    invocation
}

/// Flags accepted before the subcommand
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "machina", no_binary_name = true)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct GlobalArgs {
    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Print the version and exit
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Print help and exit
    #[arg(short = 'h', long)]
    pub help: bool,
}

impl GlobalArgs {
    /// Parse the flags found before the subcommand
    pub fn parse_main_args(main_args: &[String]) -> Result<Self> {
        Self::try_parse_from(main_args)
            .map_err(|e| MachinaError::invalid_options(e.to_string().trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn split(items: &[&str]) -> (Vec<String>, Option<String>, Vec<String>) {
        let invocation = split_main_and_subcommand(items.iter().copied());
        (
            invocation.main_args,
            invocation.subcommand,
            invocation.subcommand_args,
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_flags_around_subcommand() {
        assert_eq!(
            split(&["-v", "status", "-h", "-v"]),
            (strings(&["-v"]), Some("status".to_string()), strings(&["-h", "-v"]))
        );
    }

    #[test]
    fn test_split_subcommand_first() {
        assert_eq!(
            split(&["status", "-h"]),
            (vec![], Some("status".to_string()), strings(&["-h"]))
        );
        assert_eq!(split(&["status"]), (vec![], Some("status".to_string()), vec![]));
    }

    #[test]
    fn test_split_only_flags() {
        assert_eq!(split(&["-v", "-h"]), (strings(&["-v", "-h"]), None, vec![]));
        assert_eq!(split(&[]), (vec![], None, vec![]));
    }

    #[test]
    fn test_split_nested_subcommand_is_passed_through() {
        assert_eq!(
            split(&["-v", "box", "add", "-h"]),
            (strings(&["-v"]), Some("box".to_string()), strings(&["add", "-h"]))
        );
    }

    #[test]
    fn test_parse_global_flags() {
        let globals = GlobalArgs::parse_main_args(&strings(&["--debug", "-v"])).unwrap();
        assert!(globals.debug);
        assert!(globals.version);
        assert!(!globals.help);

        let globals = GlobalArgs::parse_main_args(&[]).unwrap();
        assert_eq!(globals, GlobalArgs::default());
    }

    #[test]
    fn test_unknown_global_flag() {
        let result = GlobalArgs::parse_main_args(&strings(&["--frobnicate"]));
        assert!(matches!(result, Err(MachinaError::InvalidOptions { .. })));
    }

    proptest! {
        #[test]
        fn prop_split_preserves_order(args in proptest::collection::vec("-?[a-z]{0,4}", 0..12)) {
            let invocation = split_main_and_subcommand(args.clone());

            prop_assert!(invocation.main_args.iter().all(|a| a.starts_with('-')));
            if let Some(subcommand) = &invocation.subcommand {
                prop_assert!(!subcommand.starts_with('-'));
            } else {
                prop_assert!(invocation.subcommand_args.is_empty());
            }

            let mut rebuilt = invocation.main_args.clone();
            rebuilt.extend(invocation.subcommand.clone());
            rebuilt.extend(invocation.subcommand_args.clone());
            prop_assert_eq!(rebuilt, args);
        }
    }
}
