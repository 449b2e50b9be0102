//! In-memory [`Environment`] for tests and embedding
//!
//! Every answer is configured up front; lookups made through
//! [`Environment::machine`] are recorded so callers can assert on the order
//! targets were resolved in.

use super::{ActiveMachine, Environment, MachineHandle, MachineName, ProviderName};
use crate::{
    error::Result,
    ui::{BufferUi, Ui},
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

pub struct StaticEnvironment {
    root_path: Option<PathBuf>,
    machine_names: Vec<MachineName>,
    active: Vec<ActiveMachine>,
    default_provider: ProviderName,
    primary: Option<MachineName>,
    ui: Arc<dyn Ui>,
    lookups: Mutex<Vec<(MachineName, ProviderName)>>,
}

impl StaticEnvironment {
    /// A project rooted at `/project` with no machines and `virtualbox` as
    /// the default provider
    pub fn new() -> Self {
        Self {
            root_path: Some(PathBuf::from("/project")),
            machine_names: Vec::new(),
            active: Vec::new(),
            default_provider: ProviderName::from("virtualbox"),
            primary: None,
            ui: Arc::new(BufferUi::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn without_root(mut self) -> Self {
        self.root_path = None;
        self
    }

    #[must_use]
    pub fn with_machines<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<MachineName>,
    {
        self.machine_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Record `name` as active under `provider`, replacing any earlier entry
    /// for the same name
    #[must_use]
    pub fn with_active(mut self, name: impl Into<MachineName>, provider: impl Into<ProviderName>) -> Self {
        let entry = ActiveMachine::new(name, provider);
        self.active.retain(|a| a.name != entry.name);
        self.active.push(entry);
        self
    }

    #[must_use]
    pub fn with_default_provider(mut self, provider: impl Into<ProviderName>) -> Self {
        self.default_provider = provider.into();
        self
    }

    #[must_use]
    pub fn with_primary(mut self, name: impl Into<MachineName>) -> Self {
        self.primary = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_ui(mut self, ui: Arc<dyn Ui>) -> Self {
        self.ui = ui;
        self
    }

    /// Every `(name, provider)` pair passed to [`Environment::machine`], in call order
    pub fn lookups(&self) -> Vec<(MachineName, ProviderName)> {
        self.lookups
            .lock()
            .map(|lookups| lookups.clone())
            .unwrap_or_default()
    }
}

impl Default for StaticEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for StaticEnvironment {
    fn root_path(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    fn active_machines(&self) -> Vec<ActiveMachine> {
        self.active.clone()
    }

    fn machine_names(&self) -> Vec<MachineName> {
        self.machine_names.clone()
    }

    fn default_provider(&self) -> ProviderName {
        self.default_provider.clone()
    }

    fn primary_machine_name(&self) -> Option<MachineName> {
        self.primary.clone()
    }

    fn machine(&self, name: &MachineName, provider: &ProviderName) -> Result<Option<MachineHandle>> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push((name.clone(), provider.clone()));
        }

        if !self.machine_names.contains(name) {
            return Ok(None);
        }

        let created = self
            .active
            .iter()
            .any(|a| &a.name == name && &a.provider == provider);
        let id = created.then(|| format!("{name}-{provider}"));

        Ok(Some(
            MachineHandle::new(name.clone(), provider.clone(), Arc::clone(&self.ui)).with_id(id),
        ))
    }
}
