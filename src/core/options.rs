//! Subcommand option parsing
//!
//! [`OptionParser`] wraps a `clap::Command` built from no-binary-name argv
//! slices. Flags are declared together with a callback; recognized flags
//! are consumed and their callbacks run once per occurrence in argv order,
//! and whatever positional tokens are left come back to the caller in their
//! original order.

use crate::{
    error::{MachinaError, Result},
    ui::Ui,
};
use clap::{Arg, ArgAction};
use tracing::{debug, instrument};

const REMAINING: &str = "__remaining";

enum Callback<'cb> {
    Flag(Box<dyn FnMut() + 'cb>),
    Value(Box<dyn FnMut(&str) + 'cb>),
}

struct Declared<'cb> {
    long: String,
    short: Option<char>,
    callback: Callback<'cb>,
}

/// Flag declarations for one subcommand
pub struct OptionParser<'cb> {
    command: clap::Command,
    declared: Vec<Declared<'cb>>,
}

impl<'cb> OptionParser<'cb> {
    /// A parser that accepts no flags; `usage` becomes the first help line
    pub fn new(usage: &str) -> Self {
        let command = clap::Command::new("machina")
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .override_usage(usage.to_string())
            .arg(
                Arg::new(REMAINING)
                    .action(ArgAction::Append)
                    .num_args(1..)
                    .value_parser(clap::value_parser!(String))
                    .hide(true),
            );

        Self {
            command,
            declared: Vec::new(),
        }
    }

    /// Text shown above the option list in help output
    #[must_use]
    pub fn about(mut self, text: &str) -> Self {
        self.command = self.command.about(text.to_string());
        self
    }

    /// Declare a boolean flag; `callback` runs once per occurrence
    #[must_use]
    pub fn flag(
        mut self,
        id: &str,
        short: Option<char>,
        help: &str,
        callback: impl FnMut() + 'cb,
    ) -> Self {
        let mut arg = Arg::new(id.to_string())
            .long(id.to_string())
            .help(help.to_string())
            .action(ArgAction::Count);
        if let Some(short) = short {
            arg = arg.short(short);
        }

        self.command = self.command.arg(arg);
        self.declared.push(Declared {
            long: id.to_string(),
            short,
            callback: Callback::Flag(Box::new(callback)),
        });
        self
    }

    /// Declare a flag taking a value; `callback` runs once per occurrence
    #[must_use]
    pub fn option(
        mut self,
        id: &str,
        value_name: &str,
        help: &str,
        callback: impl FnMut(&str) + 'cb,
    ) -> Self {
        let arg = Arg::new(id.to_string())
            .long(id.to_string())
            .value_name(value_name.to_string())
            .help(help.to_string())
            .num_args(1)
            .action(ArgAction::Append)
            .value_parser(clap::value_parser!(String));

        self.command = self.command.arg(arg);
        self.declared.push(Declared {
            long: id.to_string(),
            short: None,
            callback: Callback::Value(Box::new(callback)),
        });
        self
    }

    /// Rendered help text
    pub fn help(&mut self) -> String {
        self.command.render_help().to_string()
    }

    /// Consume recognized flags from `args`, run their callbacks and return
    /// the remaining positional tokens.
    fn parse(mut self, args: &[String]) -> Result<Vec<String>> {
        let matches = self
            .command
            .try_get_matches_from_mut(args.to_vec())
            .map_err(|e| MachinaError::invalid_options(e.to_string().trim_end()))?;

        for (index, value) in self.occurrences(args) {
            match (&mut self.declared[index].callback, value) {
                (Callback::Flag(callback), _) => callback(),
                (Callback::Value(callback), Some(value)) => callback(value),
                (Callback::Value(_), None) => {}
            }
        }

        Ok(matches
            .get_many::<String>(REMAINING)
            .into_iter()
            .flatten()
            .cloned()
            .collect())
    }

    /// Declared flags in the order they appear in `args`, with the value of
    /// each option occurrence. Only called on input clap has accepted, so
    /// every flag token names a declared flag.
    fn occurrences<'a>(&self, args: &'a [String]) -> Vec<(usize, Option<&'a str>)> {
        let mut found = Vec::new();
        let mut tokens = args.iter();

        while let Some(token) = tokens.next() {
            if token == "--" {
                break;
            }

            if let Some(long) = token.strip_prefix("--") {
                let (name, attached) = match long.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (long, None),
                };
                let Some(index) = self.declared.iter().position(|d| d.long == name) else {
                    continue;
                };
                match self.declared[index].callback {
                    Callback::Flag(_) => found.push((index, None)),
                    Callback::Value(_) => {
                        let value = attached.or_else(|| tokens.next().map(String::as_str));
                        found.push((index, value));
                    }
                }
            } else if let Some(shorts) = token.strip_prefix('-').filter(|s| !s.is_empty()) {
                for short in shorts.chars() {
                    if let Some(index) = self.declared.iter().position(|d| d.short == Some(short)) {
                        found.push((index, None));
                    }
                }
            }
        }

        found
    }
}

impl Default for OptionParser<'_> {
    fn default() -> Self {
        Self::new("machina [options]")
    }
}

fn is_help(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

/// Parse `args` for a subcommand.
///
/// Without a `parser` a flagless pass-through parser is used. If `args`
/// asks for help anywhere, the help text is written to `ui` and `Ok(None)`
/// is returned; the caller should stop and exit successfully.
#[instrument(skip(parser, ui))]
pub fn parse_options(
    parser: Option<OptionParser<'_>>,
    args: &[String],
    ui: &dyn Ui,
) -> Result<Option<Vec<String>>> {
    let mut parser = parser.unwrap_or_default();

    if args.iter().any(|arg| is_help(arg)) {
        debug!("Help requested, skipping option parsing");
        ui.info(parser.help().trim_end());
        return Ok(None);
    }

    let remaining = parser.parse(args)?;
    debug!("Remaining arguments: {:?}", remaining);
    Ok(Some(remaining))
}
