//! Target resolution
//!
//! Turns "the machine the user named", or "every machine", or "the primary
//! machine" into an ordered list of [`MachineHandle`]s, choosing a provider
//! for each one.

use crate::{
    environment::{Environment, MachineHandle, MachineName, ProviderName},
    error::{MachinaError, Result},
};
use std::vec;
use tracing::{debug, instrument};

/// How targets should be resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionOptions {
    /// Force every target onto this provider
    pub provider: Option<ProviderName>,
    /// Without an explicit name, resolve only the primary machine
    pub single_target: bool,
}

impl ResolutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider(mut self, provider: impl Into<ProviderName>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn single_target(mut self, single_target: bool) -> Self {
        self.single_target = single_target;
        self
    }
}

/// Resolves machine targets against an [`Environment`]
#[derive(Clone, Copy)]
pub struct TargetResolver<'env> {
    env: &'env dyn Environment,
}

impl<'env> TargetResolver<'env> {
    pub fn new(env: &'env dyn Environment) -> Self {
        Self { env }
    }

    /// Names to resolve, in the order they will be resolved
    pub fn candidates(
        &self,
        name: Option<&MachineName>,
        options: &ResolutionOptions,
    ) -> Result<Vec<MachineName>> {
        if let Some(name) = name {
            return Ok(vec![name.clone()]);
        }

        if options.single_target {
            let primary = self
                .env
                .primary_machine_name()
                .ok_or_else(|| MachinaError::machine_not_found("<primary>"))?;
            return Ok(vec![primary]);
        }

        Ok(self.env.machine_names())
    }

    /// Provider `name` should be operated through
    pub fn provider_for(&self, name: &MachineName, options: &ResolutionOptions) -> Result<ProviderName> {
        let active_provider = self
            .env
            .active_machines()
            .into_iter()
            .find(|active| &active.name == name)
            .map(|active| active.provider);

        match (&options.provider, active_provider) {
            (Some(requested), Some(active)) if requested != &active => {
                Err(MachinaError::active_machine_with_different_provider(
                    name.as_str(),
                    active.as_str(),
                    requested.as_str(),
                ))
            }
            (Some(requested), _) => Ok(requested.clone()),
            (None, Some(active)) => Ok(active),
            (None, None) => Ok(self.env.default_provider()),
        }
    }

    /// Handle for one candidate
    #[instrument(skip(self))]
    pub fn resolve(&self, name: &MachineName, options: &ResolutionOptions) -> Result<MachineHandle> {
        let provider = self.provider_for(name, options)?;
        debug!("Resolved {} to provider {}", name, provider);

        self.env
            .machine(name, &provider)?
            .ok_or_else(|| MachinaError::machine_not_found(name.as_str()))
    }

    /// Lazily resolve every target.
    ///
    /// Fails up front when there is no project; each candidate is only
    /// resolved when the iterator reaches it.
    pub fn targets(
        &self,
        name: Option<&MachineName>,
        options: &ResolutionOptions,
    ) -> Result<Targets<'env>> {
        if self.env.root_path().is_none() {
            return Err(MachinaError::NoEnvironment);
        }

        let candidates = self.candidates(name, options)?;
        debug!("Target candidates: {:?}", candidates);

        Ok(Targets {
            resolver: *self,
            candidates: candidates.into_iter(),
            options: options.clone(),
        })
    }
}

/// Iterator over resolved targets, see [`TargetResolver::targets`]
pub struct Targets<'env> {
    resolver: TargetResolver<'env>,
    candidates: vec::IntoIter<MachineName>,
    options: ResolutionOptions,
}

impl Iterator for Targets<'_> {
    type Item = Result<MachineHandle>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.candidates.next()?;
        Some(self.resolver.resolve(&name, &self.options))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.candidates.size_hint()
    }
}

/// Run `action` on every target, one at a time and in order.
///
/// `name` is normalized before lookup. The first resolution failure or
/// action failure stops the walk and is returned.
#[instrument(skip(env, action))]
pub fn with_target_vms<F, E>(
    env: &dyn Environment,
    name: Option<&str>,
    options: &ResolutionOptions,
    mut action: F,
) -> std::result::Result<(), E>
where
    F: FnMut(&MachineHandle) -> std::result::Result<(), E>,
    E: From<MachinaError>,
{
    let name = name.map(MachineName::from);
    let resolver = TargetResolver::new(env);

    for handle in resolver.targets(name.as_ref(), options)? {
        let handle = handle?;
        debug!("Running action on {} ({})", handle.name, handle.provider);
        action(&handle)?;
    }
    Ok(())
}
