//! The environment a command runs against
//!
//! An [`Environment`] knows which machines a project defines, which of them
//! are currently instantiated and under which provider, and hands out
//! [`MachineHandle`]s. The command layer only reads from it.

pub mod project;
pub mod testing;

pub use project::{MachineDefinition, Manifest, ProjectEnvironment};
pub use testing::StaticEnvironment;

use crate::{error::Result, ui::Ui};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, sync::Arc};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Build the canonical form: surrounding whitespace and a leading
            /// `:` are dropped, so `":web"` and `"web"` are the same name.
            pub fn new(raw: impl AsRef<str>) -> Self {
                let raw = raw.as_ref().trim();
                Self(raw.strip_prefix(':').unwrap_or(raw).to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::new(raw)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

identifier! {
    /// Name of a machine, unique within an environment
    MachineName
}

identifier! {
    /// Identifier of the backend that operates a machine
    ProviderName
}

/// A machine the environment reports as instantiated under a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMachine {
    pub name: MachineName,
    pub provider: ProviderName,
}

impl ActiveMachine {
    pub fn new(name: impl Into<MachineName>, provider: impl Into<ProviderName>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
        }
    }
}

/// Whether a machine has been created by its provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Created,
    NotCreated,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::NotCreated => f.write_str("not created"),
        }
    }
}

/// Live handle for one (name, provider) pair
#[derive(Clone)]
pub struct MachineHandle {
    pub name: MachineName,
    pub provider: ProviderName,
    /// Provider-assigned identifier, present once the machine was created
    pub id: Option<String>,
    pub ui: Arc<dyn Ui>,
}

impl MachineHandle {
    pub fn new(name: MachineName, provider: ProviderName, ui: Arc<dyn Ui>) -> Self {
        Self {
            name,
            provider,
            id: None,
            ui,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn state(&self) -> MachineState {
        if self.id.is_some() {
            MachineState::Created
        } else {
            MachineState::NotCreated
        }
    }
}

impl fmt::Debug for MachineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineHandle")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Everything target resolution needs to know about a project.
///
/// A name appears at most once in [`Environment::active_machines`].
pub trait Environment {
    /// Root of the project; `None` outside any project
    fn root_path(&self) -> Option<&Path>;

    /// Machines currently instantiated, with the provider they run under
    fn active_machines(&self) -> Vec<ActiveMachine>;

    /// Every machine the project defines, in definition order
    fn machine_names(&self) -> Vec<MachineName>;

    fn default_provider(&self) -> ProviderName;

    /// The machine used when a single target is wanted and none was named
    fn primary_machine_name(&self) -> Option<MachineName>;

    /// Handle for `name` under `provider`, or `None` if no such machine exists
    fn machine(&self, name: &MachineName, provider: &ProviderName) -> Result<Option<MachineHandle>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::BufferUi;

    #[test]
    fn test_names_are_normalized() {
        assert_eq!(MachineName::from(":web"), MachineName::from("web"));
        assert_eq!(MachineName::from(" web "), MachineName::from(String::from("web")));
        assert_eq!(ProviderName::from(":docker").as_str(), "docker");
    }

    #[test]
    fn test_names_deserialize_canonically() {
        #[derive(Deserialize)]
        struct Wrapper {
            name: MachineName,
        }

        let wrapper: Wrapper = toml::from_str("name = \":db\"").unwrap();
        assert_eq!(wrapper.name, MachineName::from("db"));
    }

    #[test]
    fn test_machine_state_follows_id() {
        let ui: Arc<dyn Ui> = Arc::new(BufferUi::new());
        let handle = MachineHandle::new("web".into(), "docker".into(), ui);
        assert_eq!(handle.state(), MachineState::NotCreated);

        let handle = handle.with_id(Some("abc".to_string()));
        assert_eq!(handle.state(), MachineState::Created);
        assert_eq!(handle.state().to_string(), "created");
    }
}
