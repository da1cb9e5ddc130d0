//! Command registry: name to factory mapping

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, instrument};

use crate::commands::builtin;
use crate::commands::error::{CommandError, CommandResult};
use crate::commands::Command;

/// Produces a fresh command instance per dispatch.
pub type CommandFactory = Box<dyn Fn() -> Box<dyn Command> + Send + Sync>;

#[derive(Default)]
pub struct CommandRegistry {
    factories: BTreeMap<String, CommandFactory>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Binds `name` to `factory`; a previous binding is replaced silently.
    #[instrument(level = "trace", skip(self, factory))]
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Command> + Send + Sync + 'static,
    {
        if self.factories.insert(name.to_string(), Box::new(factory)).is_some() {
            debug!("command {} re-registered", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn instantiate(&self, name: &str) -> CommandResult<Box<dyn Command>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| CommandError::NotFound(name.to_string()))
    }
}
