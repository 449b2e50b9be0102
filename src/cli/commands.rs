//! Built-in subcommands and top-level dispatch

use crate::{
    cli::{GlobalArgs, ParsedInvocation},
    config::Config,
    core::{Command, OptionParser, ResolutionOptions},
    environment::ProjectEnvironment,
    error::MachinaError,
    ui::Ui,
    utils::net::network_address,
};
use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Subcommand names with a one-line description, as listed in help
pub const SUBCOMMANDS: &[(&str, &str)] = &[
    ("network-address", "compute the network address of an IP and mask"),
    ("provider", "show the provider of the primary or named machine"),
    ("status", "show the state of every or the named machine"),
    ("version", "print the version of machina"),
];

/// Text printed for `machina --help` or a bare `machina`
pub fn global_help() -> String {
    let mut help = String::from(
        "Usage: machina [--debug] [-v|--version] [-h|--help] <command> [<args>]\n\nCommands:\n",
    );
    for (name, about) in SUBCOMMANDS {
        help.push_str(&format!("     {name:<17}{about}\n"));
    }
    help.push_str("\nFor help on any command run `machina <command> -h`");
    help
}

pub fn version_line() -> String {
    format!("machina {}", env!("CARGO_PKG_VERSION"))
}

/// Dispatch a split invocation and return the process exit status
#[instrument(skip(config, ui))]
pub fn execute_command(
    config: &Config,
    globals: &GlobalArgs,
    invocation: &ParsedInvocation,
    ui: Arc<dyn Ui>,
) -> anyhow::Result<u8> {
    if globals.version {
        ui.info(&version_line());
        return Ok(0);
    }

    let Some(name) = invocation.subcommand.as_deref() else {
        ui.info(&global_help());
        return Ok(0);
    };
    if globals.help {
        ui.info(&global_help());
        return Ok(0);
    }

    let argv = invocation.subcommand_args.clone();
    debug!("Dispatching '{}' with {:?}", name, argv);

    match name {
        "network-address" => execute_network_address_command(argv, ui),
        "provider" => {
            let env = load_environment(config, &ui)?;
            let command = Command::new(argv, &env, ui);
            execute_provider_command(&command)
        }
        "status" => {
            let env = load_environment(config, &ui)?;
            let command = Command::new(argv, &env, ui);
            execute_status_command(&command)
        }
        "version" => execute_version_command(argv, ui),
        other => {
            ui.error(&format!("'{other}' is not a machina command.\n"));
            ui.error(&global_help());
            Ok(1)
        }
    }
}

fn load_environment(config: &Config, ui: &Arc<dyn Ui>) -> anyhow::Result<ProjectEnvironment> {
    ProjectEnvironment::load(config, Arc::clone(ui)).context("Failed to load environment")
}

/// At most one positional argument naming a machine
fn single_name(argv: &[String], usage: &str) -> Result<Option<String>, MachinaError> {
    match argv {
        [] => Ok(None),
        [name] => Ok(Some(name.clone())),
        _ => Err(MachinaError::invalid_options(format!(
            "Too many arguments: {}\nUsage: {usage}",
            argv.join(" ")
        ))),
    }
}

/// `machina status [name] [--provider NAME]`
#[instrument(skip(command))]
pub fn execute_status_command(command: &Command<'_>) -> anyhow::Result<u8> {
    const USAGE: &str = "machina status [name] [--provider NAME]";

    let mut provider = None;
    let parser = OptionParser::new(USAGE)
        .about("Shows the state of the machines in this project.")
        .option("provider", "NAME", "Resolve machines under this provider", |p| {
            provider = Some(p.to_string());
        });
    let Some(argv) = command.parse_options(Some(parser))? else {
        return Ok(0);
    };
    let name = single_name(&argv, USAGE)?;

    let mut options = ResolutionOptions::new();
    if let Some(provider) = provider {
        options = options.provider(provider);
    }

    let ui = command.ui();
    ui.info("Current machine states:\n");
    let mut count = 0usize;
    command.with_target_vms(name.as_deref(), &options, |machine| {
        ui.info(&format!(
            "{:<25} {} ({})",
            machine.name,
            machine.state(),
            machine.provider
        ));
        count += 1;
        Ok::<(), anyhow::Error>(())
    })?;

    info!("Reported status for {} machine(s)", count);
    Ok(0)
}

/// `machina provider [name]`
#[instrument(skip(command))]
pub fn execute_provider_command(command: &Command<'_>) -> anyhow::Result<u8> {
    const USAGE: &str = "machina provider [name]";

    let parser = OptionParser::new(USAGE).about("Shows the provider of the primary or named machine.");
    let Some(argv) = command.parse_options(Some(parser))? else {
        return Ok(0);
    };
    let name = single_name(&argv, USAGE)?;

    let options = ResolutionOptions::new().single_target(true);
    command.with_target_vms(name.as_deref(), &options, |machine| {
        command.ui().info(machine.provider.as_str());
        Ok::<(), anyhow::Error>(())
    })?;
    Ok(0)
}

/// `machina version`
pub fn execute_version_command(argv: Vec<String>, ui: Arc<dyn Ui>) -> anyhow::Result<u8> {
    let parser = OptionParser::new("machina version").about("Prints the version of machina.");
    let Some(rest) = crate::core::parse_options(Some(parser), &argv, ui.as_ref())? else {
        return Ok(0);
    };
    if !rest.is_empty() {
        return Err(MachinaError::invalid_options(format!("Unexpected arguments: {}", rest.join(" "))).into());
    }

    ui.info(&version_line());
    Ok(0)
}

/// `machina network-address IP MASK`
pub fn execute_network_address_command(argv: Vec<String>, ui: Arc<dyn Ui>) -> anyhow::Result<u8> {
    const USAGE: &str = "machina network-address IP MASK";

    let parser = OptionParser::new(USAGE).about("Prints the network address of IP under MASK.");
    let Some(rest) = crate::core::parse_options(Some(parser), &argv, ui.as_ref())? else {
        return Ok(0);
    };

    let [ip, mask] = rest.as_slice() else {
        return Err(MachinaError::invalid_options(format!("Expected IP and MASK\nUsage: {USAGE}")).into());
    };

    let network = network_address(ip, mask).with_context(|| format!("Cannot compute network of {ip}/{mask}"))?;
    ui.info(&network);
    Ok(0)
}
