use anyhow::Result;
use machina::{
    cli::{self, GlobalArgs},
    config::Config,
    error::MachinaError,
    setup_logging,
    ui::{ConsoleUi, Ui},
};
use std::{process::ExitCode, sync::Arc};

fn main() -> ExitCode {
    let ui: Arc<dyn Ui> = Arc::new(ConsoleUi);

    match run(Arc::clone(&ui)) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            ui.error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(ui: Arc<dyn Ui>) -> Result<u8> {
    let args = std::env::args_os()
        .skip(1)
        .map(|arg| {
            arg.into_string().map_err(|arg| {
                MachinaError::invalid_options(format!("Argument is not valid UTF-8: {}", arg.to_string_lossy()))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Split global flags from the subcommand and its arguments
    let invocation = cli::split_main_and_subcommand(args);
    let globals = GlobalArgs::parse_main_args(&invocation.main_args)?;

    setup_logging(globals.debug)?;

    let config = Config::from_globals(&globals)?;
    cli::execute_command(&config, &globals, &invocation, ui)
}
