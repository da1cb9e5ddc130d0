//! Dispatcher: runs commands inside a transaction bracket
//!
//! A [`Session`] owns the registry and one [`Workspace`]. Each dispatch wraps
//! the scene root (once), opens a batch when the command records undo, runs
//! the command and commits. Nested dispatches flatten into the open batch.
//! A failing command has its partial changes rolled back.

use serde_json::Value as JsonValue;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::commands::args::CommandArgs;
use crate::commands::error::{CommandError, CommandResult};
use crate::commands::registry::CommandRegistry;
use crate::domain::{NodeId, NodeSnapshot, ObjectDefaults, SceneArena};
use crate::history::{
    HistoryResult, Interceptor, RebuildNotifier, ReplayReport, Tracked, TransactionManager,
};

/// Editing state of one open document.
#[derive(Debug)]
pub struct Workspace {
    pub arena: SceneArena,
    pub interceptor: Interceptor,
    pub history: TransactionManager,
    pub notifier: RebuildNotifier,
    pub selection: Option<NodeId>,
    pub defaults: ObjectDefaults,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(ObjectDefaults::default(), 0, RebuildNotifier::silent())
    }
}

impl Workspace {
    /// Empty workspace without a scene; run `newFile` or `openScene` first.
    pub fn new(defaults: ObjectDefaults, history_limit: usize, notifier: RebuildNotifier) -> Self {
        Self {
            arena: SceneArena::new(),
            interceptor: Interceptor::new(),
            history: TransactionManager::with_limit(history_limit),
            notifier,
            selection: None,
            defaults,
        }
    }

    pub fn scene_root(&self) -> Option<NodeId> {
        self.arena.root()
    }

    pub fn has_scene(&self) -> bool {
        self.arena.root().is_some()
    }

    /// Swaps in a new document. History and selection refer to the old
    /// arena and are dropped.
    pub fn replace_scene(&mut self, arena: SceneArena) {
        self.arena = arena;
        self.interceptor.reset();
        self.history.clear();
        self.selection = None;
    }

    pub fn tracked(&mut self) -> Tracked<'_> {
        Tracked::new(&mut self.arena, &mut self.interceptor, &mut self.history)
    }

    pub fn undo(&mut self) -> HistoryResult<Option<ReplayReport>> {
        self.history.undo(&mut self.arena, &self.notifier)
    }

    pub fn redo(&mut self) -> HistoryResult<Option<ReplayReport>> {
        self.history.redo(&mut self.arena, &self.notifier)
    }

    /// Snapshot of the whole scene, None without a scene.
    pub fn snapshot(&self) -> CommandResult<Option<NodeSnapshot>> {
        self.arena
            .root()
            .map(|root| self.arena.snapshot(root))
            .transpose()
            .map_err(CommandError::from)
    }
}

/// A command registry bound to one workspace.
#[derive(Debug)]
pub struct Session {
    registry: CommandRegistry,
    workspace: Workspace,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CommandRegistry::with_builtins(), Workspace::default())
    }
}

impl Session {
    pub fn new(registry: CommandRegistry, workspace: Workspace) -> Self {
        Self {
            registry,
            workspace,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub fn dispatch(&mut self, name: &str, args: &CommandArgs) -> CommandResult<JsonValue> {
        dispatch(&self.registry, &mut self.workspace, name, args)
    }

    pub fn undo(&mut self) -> HistoryResult<Option<ReplayReport>> {
        self.workspace.undo()
    }

    pub fn redo(&mut self) -> HistoryResult<Option<ReplayReport>> {
        self.workspace.redo()
    }
}

#[instrument(level = "debug", skip(registry, workspace, args))]
fn dispatch(
    registry: &CommandRegistry,
    workspace: &mut Workspace,
    name: &str,
    args: &CommandArgs,
) -> CommandResult<JsonValue> {
    let mut command = registry.instantiate(name)?;

    if let Some(root) = workspace.arena.root() {
        workspace.interceptor.wrap(&workspace.arena, root);
    }

    let record = args
        .should_record_undo()
        .unwrap_or_else(|| command.should_record_undo());
    if command.should_cancel_previous_command() {
        debug!("{} asks to cancel the previous command, ignored", name);
    }

    // an open batch belongs to the outer dispatch
    let owns_batch = record && !workspace.history.is_batching();
    if owns_batch {
        workspace.history.start_named_batch(name);
    } else if workspace.history.is_batching() {
        debug!("{} joins the open batch", name);
    }

    let result = {
        let mut ctx = CommandContext {
            registry,
            workspace: &mut *workspace,
        };
        command.execute(&mut ctx, args)
    };

    match result {
        Ok(value) => {
            if owns_batch {
                workspace.history.end_batch();
            }
            Ok(value)
        }
        Err(err) => {
            warn!("{} failed: {}", name, err);
            if owns_batch {
                if let Err(rollback) = workspace.history.abort_batch(&mut workspace.arena) {
                    error!("rollback of {} failed: {}", name, rollback);
                }
            }
            Err(err)
        }
    }
}

/// What a running command sees of the session.
pub struct CommandContext<'a> {
    registry: &'a CommandRegistry,
    workspace: &'a mut Workspace,
}

impl<'a> CommandContext<'a> {
    /// Runs another command; it joins the current batch.
    pub fn dispatch(&mut self, name: &str, args: &CommandArgs) -> CommandResult<JsonValue> {
        dispatch(self.registry, self.workspace, name, args)
    }

    pub fn workspace(&self) -> &Workspace {
        self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        self.workspace
    }

    pub fn arena(&self) -> &SceneArena {
        &self.workspace.arena
    }

    pub fn tracked(&mut self) -> Tracked<'_> {
        self.workspace.tracked()
    }

    pub fn defaults(&self) -> &ObjectDefaults {
        &self.workspace.defaults
    }

    /// Scene root, or a logged warning when no scene is open.
    pub fn require_scene(&self, command: &str) -> Option<NodeId> {
        let root = self.workspace.scene_root();
        if root.is_none() {
            warn!("{}: scene is not initialized", command);
        }
        root
    }

    /// Rebuilds one object after a forward edit.
    pub fn rebuild(&self, id: NodeId) -> bool {
        self.workspace.notifier.rebuild_one(&self.workspace.arena, id)
    }

    /// Selected object, if it is still part of the scene.
    pub fn selection(&self) -> Option<NodeId> {
        self.workspace
            .selection
            .filter(|&id| self.workspace.arena.in_scene(id))
    }

    pub fn select(&mut self, id: NodeId) {
        self.workspace.selection = Some(id);
    }

    pub fn deselect(&mut self) -> Option<NodeId> {
        self.workspace.selection.take()
    }

    /// Resolves an object of the current scene by its uuid string.
    ///
    /// Detached nodes kept alive for history do not resolve.
    pub fn resolve(&self, uuid: &str) -> CommandResult<NodeId> {
        let parsed = Uuid::parse_str(uuid).map_err(|e| CommandError::invalid("uuid", e.to_string()))?;
        let arena = &self.workspace.arena;
        arena
            .root()
            .and_then(|root| {
                arena
                    .descendants(root)
                    .find(|(_, node)| node.uuid == parsed)
                    .map(|(id, _)| id)
            })
            .ok_or_else(|| CommandError::UnknownObject(uuid.to_string()))
    }

    /// Target of an edit: the `uuid` argument if given, else the selection.
    pub fn target(&self, args: &CommandArgs) -> CommandResult<Option<NodeId>> {
        match args.get_as::<String>("uuid")? {
            Some(uuid) => self.resolve(&uuid).map(Some),
            None => Ok(self.selection()),
        }
    }

    pub fn replace_scene(&mut self, arena: SceneArena) {
        self.workspace.replace_scene(arena);
    }
}
