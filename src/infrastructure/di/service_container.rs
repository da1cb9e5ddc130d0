//! Service container for dependency injection
//!
//! Wires up sessions and services with their dependencies.

use std::sync::Arc;

use crate::application::services::ScriptService;
use crate::commands::{CommandRegistry, Session, Workspace};
use crate::config::Settings;
use crate::history::{RebuildHook, RebuildNotifier};
use crate::infrastructure::traits::{FileSystem, RealFileSystem, TracingRebuildHook};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Receives rebuild requests for affected objects
    pub rebuild: Arc<dyn RebuildHook>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(TracingRebuildHook))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        rebuild: Arc<dyn RebuildHook>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            rebuild,
        }
    }

    /// Fresh editing session with the built-in commands and no scene.
    pub fn session(&self) -> Session {
        let workspace = Workspace::new(
            self.settings.defaults.clone(),
            self.settings.history.limit,
            RebuildNotifier::new(self.rebuild.clone()),
        );
        Session::new(CommandRegistry::with_builtins(), workspace)
    }

    pub fn script_service(&self) -> ScriptService {
        ScriptService::new(self.fs.clone())
    }
}
