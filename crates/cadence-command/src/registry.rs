//! Name to command factory mapping.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::command::Command;

/// Builds a fresh command instance per invocation.
pub type CommandFactory = Arc<dyn Fn() -> Arc<dyn Command> + Send + Sync>;

/// Name to command-factory mapping.
///
/// Lookup is exact and case-sensitive.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    factories: BTreeMap<String, CommandFactory>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Command> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            warn!(command = %name, "Replacing previously registered command");
        }
    }

    /// Chaining form of [`register`](Self::register).
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Command> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Instantiate the command registered as `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.factories.get(name).map(|factory| factory())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// `(name, description)` for every command, sorted by name.
    #[must_use]
    pub fn describe(&self) -> Vec<(String, String)> {
        self.factories
            .iter()
            .map(|(name, factory)| (name.clone(), factory().description().to_string()))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
