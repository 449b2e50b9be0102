//! Project environment backed by a `Machinefile` on disk
//!
//! The project root is the nearest directory at or above the working
//! directory that contains the manifest. Machine state lives under
//! `<root>/.machina/machines/<name>/<provider>/id`; an `id` file with
//! content means the machine exists under that provider.

use super::{ActiveMachine, Environment, MachineHandle, MachineName, ProviderName};
use crate::{
    config::Config,
    error::{MachinaError, Result},
    ui::Ui,
    utils::fs::FileSystemUtils,
};
use serde::Deserialize;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, instrument, warn};

/// Provider used when neither the process nor the manifest names one
pub const FALLBACK_PROVIDER: &str = "virtualbox";

/// Machine defined when the manifest declares none
pub const DEFAULT_MACHINE: &str = "default";

/// Parsed `Machinefile`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Provider used for machines that are not active
    pub default_provider: Option<ProviderName>,
    /// Machines in definition order
    #[serde(default, rename = "machine")]
    pub machines: Vec<MachineDefinition>,
}

/// One `[[machine]]` table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MachineDefinition {
    pub name: MachineName,
    #[serde(default)]
    pub primary: bool,
}

impl Manifest {
    /// Parse manifest text; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let manifest: Self = toml::from_str(content).map_err(|e| {
            MachinaError::config_with_source(format!("Invalid manifest {}", origin.display()), e)
        })?;
        manifest.validate(origin)?;
        Ok(manifest)
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let mut seen = HashSet::new();
        for machine in &self.machines {
            if machine.name.as_str().is_empty() {
                return Err(MachinaError::config(format!(
                    "Machine with an empty name in {}",
                    origin.display()
                )));
            }
            if !seen.insert(&machine.name) {
                return Err(MachinaError::config(format!(
                    "Machine '{}' is defined more than once in {}",
                    machine.name,
                    origin.display()
                )));
            }
        }
        Ok(())
    }

    /// Machine names in definition order, or the implicit default machine
    pub fn machine_names(&self) -> Vec<MachineName> {
        if self.machines.is_empty() {
            return vec![MachineName::from(DEFAULT_MACHINE)];
        }
        self.machines.iter().map(|m| m.name.clone()).collect()
    }

    /// The first machine flagged primary, else the only machine
    pub fn primary_machine_name(&self) -> Option<MachineName> {
        if let Some(primary) = self.machines.iter().find(|m| m.primary) {
            return Some(primary.name.clone());
        }

        match self.machine_names().as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        }
    }
}

/// [`Environment`] for a project directory
pub struct ProjectEnvironment {
    root_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    manifest: Manifest,
    default_provider: ProviderName,
    active: Vec<ActiveMachine>,
    ui: Arc<dyn Ui>,
    fs_utils: FileSystemUtils,
}

impl ProjectEnvironment {
    /// Discover the project for `config.cwd` and read its state.
    ///
    /// Running outside a project is not an error here; the environment
    /// simply reports no root.
    #[instrument(skip(config, ui), fields(cwd = %config.cwd.display()))]
    pub fn load(config: &Config, ui: Arc<dyn Ui>) -> Result<Self> {
        let fs_utils = FileSystemUtils::new();
        let root_path = fs_utils.find_upwards(&config.cwd, &config.project_file);

        let manifest = match &root_path {
            Some(root) => {
                let path = root.join(&config.project_file);
                let content = fs_utils
                    .read_file_to_string(&path)
                    .map_err(|e| MachinaError::file_system("read", &path, e))?;
                Manifest::parse(&content, &path)?
            }
            None => {
                debug!("No {} found, running without a project", config.project_file);
                Manifest::default()
            }
        };

        let default_provider = config
            .default_provider
            .as_deref()
            .map(ProviderName::from)
            .or_else(|| manifest.default_provider.clone())
            .unwrap_or_else(|| ProviderName::from(FALLBACK_PROVIDER));

        let data_dir = root_path.as_ref().map(|root| root.join(&config.data_dir_name));

        let mut env = Self {
            root_path,
            data_dir,
            manifest,
            default_provider,
            active: Vec::new(),
            ui,
            fs_utils,
        };
        env.active = env.scan_active_machines()?;

        info!(
            "Loaded environment: root={:?}, machines={}, active={}, default_provider={}",
            env.root_path,
            env.manifest.machine_names().len(),
            env.active.len(),
            env.default_provider
        );
        Ok(env)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn machine_dir(&self, name: &MachineName, provider: &ProviderName) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| {
            dir.join("machines")
                .join(name.as_str())
                .join(provider.as_str())
        })
    }

    /// Find every `machines/<name>/<provider>/id` marker with content.
    fn scan_active_machines(&self) -> Result<Vec<ActiveMachine>> {
        let Some(data_dir) = &self.data_dir else {
            return Ok(Vec::new());
        };

        let machines_dir = data_dir.join("machines");
        if !self.fs_utils.is_dir(&machines_dir) {
            return Ok(Vec::new());
        }

        let pattern = format!(
            "{}/*/*/id",
            glob::Pattern::escape(&machines_dir.to_string_lossy())
        );
        let paths = glob::glob(&pattern).map_err(|e| {
            MachinaError::config_with_source(format!("Invalid machine data path {pattern}"), e)
        })?;

        let mut active: Vec<ActiveMachine> = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                MachinaError::file_system("scan", path, e.into())
            })?;

            let id = self
                .fs_utils
                .read_marker(&path)
                .map_err(|e| MachinaError::file_system("read", &path, e))?;
            if id.is_none() {
                continue;
            }

            let provider_dir = path.parent();
            let provider = provider_dir.and_then(Path::file_name);
            let name = provider_dir.and_then(Path::parent).and_then(Path::file_name);
            let (Some(name), Some(provider)) = (name, provider) else {
                continue;
            };

            let entry = ActiveMachine::new(
                name.to_string_lossy().into_owned(),
                provider.to_string_lossy().into_owned(),
            );
            if let Some(existing) = active.iter().find(|a| a.name == entry.name) {
                warn!(
                    "Machine '{}' has state for providers '{}' and '{}'; using '{}'",
                    entry.name, existing.provider, entry.provider, existing.provider
                );
                continue;
            }

            debug!("Active machine: {} ({})", entry.name, entry.provider);
            active.push(entry);
        }

        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }
}

impl Environment for ProjectEnvironment {
    fn root_path(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    fn active_machines(&self) -> Vec<ActiveMachine> {
        self.active.clone()
    }

    fn machine_names(&self) -> Vec<MachineName> {
        if self.root_path.is_none() {
            return Vec::new();
        }
        self.manifest.machine_names()
    }

    fn default_provider(&self) -> ProviderName {
        self.default_provider.clone()
    }

    fn primary_machine_name(&self) -> Option<MachineName> {
        self.root_path.as_ref()?;
        self.manifest.primary_machine_name()
    }

    fn machine(&self, name: &MachineName, provider: &ProviderName) -> Result<Option<MachineHandle>> {
        if !self.machine_names().contains(name) {
            return Ok(None);
        }

        let id = match self.machine_dir(name, provider) {
            Some(dir) => {
                let path = dir.join("id");
                self.fs_utils
                    .read_marker(&path)
                    .map_err(|e| MachinaError::file_system("read", &path, e))?
            }
            None => None,
        };

        Ok(Some(
            MachineHandle::new(name.clone(), provider.clone(), Arc::clone(&self.ui)).with_id(id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{environment::MachineState, ui::BufferUi};
    use std::fs;
    use tempfile::TempDir;

    fn project(manifest: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Machinefile"), manifest).unwrap();
        temp_dir
    }

    fn mark_active(root: &Path, name: &str, provider: &str, id: &str) {
        let dir = root.join(".machina/machines").join(name).join(provider);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("id"), id).unwrap();
    }

    fn load(dir: &Path) -> ProjectEnvironment {
        ProjectEnvironment::load(&Config::for_dir(dir), Arc::new(BufferUi::new())).unwrap()
    }

    const TWO_MACHINES: &str = r#"
default_provider = "docker"

[[machine]]
name = "web"

[[machine]]
name = "db"
primary = true
"#;

    #[test]
    fn test_outside_project() {
        let temp_dir = TempDir::new().unwrap();
        let env = load(temp_dir.path());

        assert!(env.root_path().is_none());
        assert!(env.machine_names().is_empty());
        assert!(env.primary_machine_name().is_none());
        assert!(env.active_machines().is_empty());
        assert_eq!(env.default_provider().as_str(), FALLBACK_PROVIDER);
    }

    #[test]
    fn test_manifest_machines_and_primary() {
        let temp_dir = project(TWO_MACHINES);
        let env = load(temp_dir.path());

        assert_eq!(env.root_path(), Some(temp_dir.path()));
        assert_eq!(
            env.machine_names(),
            vec![MachineName::from("web"), MachineName::from("db")]
        );
        assert_eq!(env.primary_machine_name(), Some(MachineName::from("db")));
        assert_eq!(env.default_provider().as_str(), "docker");
    }

    #[test]
    fn test_empty_manifest_has_default_machine() {
        let temp_dir = project("");
        let env = load(temp_dir.path());

        assert_eq!(env.machine_names(), vec![MachineName::from(DEFAULT_MACHINE)]);
        assert_eq!(env.primary_machine_name(), Some(MachineName::from(DEFAULT_MACHINE)));
    }

    #[test]
    fn test_no_primary_among_several_machines() {
        let temp_dir = project("[[machine]]\nname = \"a\"\n\n[[machine]]\nname = \"b\"\n");
        let env = load(temp_dir.path());
        assert!(env.primary_machine_name().is_none());
    }

    #[test]
    fn test_root_found_from_subdirectory() {
        let temp_dir = project(TWO_MACHINES);
        let nested = temp_dir.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();

        let env = load(&nested);
        assert_eq!(env.root_path(), Some(temp_dir.path()));
    }

    #[test]
    fn test_config_provider_overrides_manifest() {
        let temp_dir = project(TWO_MACHINES);
        let config = Config {
            default_provider: Some("libvirt".to_string()),
            ..Config::for_dir(temp_dir.path())
        };
        let env = ProjectEnvironment::load(&config, Arc::new(BufferUi::new())).unwrap();
        assert_eq!(env.default_provider().as_str(), "libvirt");
    }

    #[test]
    fn test_active_machines_from_id_files() {
        let temp_dir = project(TWO_MACHINES);
        mark_active(temp_dir.path(), "web", "docker", "c0ffee");
        mark_active(temp_dir.path(), "db", "virtualbox", "1234");
        // An empty id means the provider cleaned up after a destroy
        mark_active(temp_dir.path(), "ghost", "docker", "");

        let env = load(temp_dir.path());
        assert_eq!(
            env.active_machines(),
            vec![
                ActiveMachine::new("db", "virtualbox"),
                ActiveMachine::new("web", "docker"),
            ]
        );
    }

    #[test]
    fn test_active_machine_reported_once_per_name() {
        let temp_dir = project(TWO_MACHINES);
        mark_active(temp_dir.path(), "web", "docker", "one");
        mark_active(temp_dir.path(), "web", "virtualbox", "two");

        let env = load(temp_dir.path());
        assert_eq!(env.active_machines(), vec![ActiveMachine::new("web", "docker")]);
    }

    #[test]
    fn test_machine_handle_reads_id() {
        let temp_dir = project(TWO_MACHINES);
        mark_active(temp_dir.path(), "web", "docker", "c0ffee");
        let env = load(temp_dir.path());

        let web = env
            .machine(&"web".into(), &"docker".into())
            .unwrap()
            .unwrap();
        assert_eq!(web.id.as_deref(), Some("c0ffee"));
        assert_eq!(web.state(), MachineState::Created);

        let db = env.machine(&"db".into(), &"docker".into()).unwrap().unwrap();
        assert_eq!(db.state(), MachineState::NotCreated);

        assert!(env.machine(&"nope".into(), &"docker".into()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_manifests() {
        let origin = Path::new("Machinefile");
        assert!(Manifest::parse("bogus = 1", origin).is_err());
        assert!(Manifest::parse("[[machine]]\nname = \"a\"\n[[machine]]\nname = \":a\"\n", origin).is_err());
        assert!(Manifest::parse("[[machine]]\nname = \"\"\n", origin).is_err());
        assert!(Manifest::parse("default_provider = [", origin).is_err());
    }
}
