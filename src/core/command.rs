//! Per-invocation state shared by subcommand handlers

use super::{
    options::{self, OptionParser},
    resolver::{self, ResolutionOptions},
};
use crate::{
    environment::{Environment, MachineHandle},
    error::{MachinaError, Result},
    ui::Ui,
};
use std::sync::Arc;

/// One subcommand invocation: its own arguments, the environment it runs
/// against and where its output goes.
pub struct Command<'env> {
    argv: Vec<String>,
    env: &'env dyn Environment,
    ui: Arc<dyn Ui>,
}

impl<'env> Command<'env> {
    pub fn new(argv: Vec<String>, env: &'env dyn Environment, ui: Arc<dyn Ui>) -> Self {
        Self { argv, env, ui }
    }

    /// Arguments after the subcommand name, unparsed
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn env(&self) -> &'env dyn Environment {
        self.env
    }

    pub fn ui(&self) -> &Arc<dyn Ui> {
        &self.ui
    }

    /// Parse this invocation's arguments, see [`options::parse_options`]
    pub fn parse_options(&self, parser: Option<OptionParser<'_>>) -> Result<Option<Vec<String>>> {
        options::parse_options(parser, &self.argv, self.ui.as_ref())
    }

    /// Run `action` once per resolved target, see [`resolver::with_target_vms`]
    pub fn with_target_vms<F, E>(
        &self,
        name: Option<&str>,
        options: &ResolutionOptions,
        action: F,
    ) -> std::result::Result<(), E>
    where
        F: FnMut(&MachineHandle) -> std::result::Result<(), E>,
        E: From<MachinaError>,
    {
        resolver::with_target_vms(self.env, name, options, action)
    }
}
