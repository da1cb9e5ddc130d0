//! Scene document commands: new, open, load, save

use std::collections::HashSet;

use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};
use uuid::Uuid;

use crate::commands::builtin::describe;
use crate::commands::{Command, CommandArgs, CommandContext, CommandError, CommandResult};
use crate::domain::{NodeKind, NodeSnapshot, SceneArena};

/// Starts an empty document. Resets history.
pub struct NewFile;

impl Command for NewFile {
    fn name(&self) -> &'static str {
        "newFile"
    }

    fn should_record_undo(&self) -> bool {
        false
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let mut arena = SceneArena::with_scene_root();
        if let Some(name) = args.get_as::<String>("name")? {
            if let Some(root) = arena.root().and_then(|root| arena.get_mut(root)) {
                root.props.insert("name".to_string(), name.into());
            }
        }
        let root = arena.root().map(|root| describe(&arena, root));
        ctx.replace_scene(arena);
        info!("new scene created");
        Ok(root.unwrap_or(JsonValue::Null))
    }
}

/// Replaces the document with a scene snapshot. Resets history.
pub struct OpenScene;

impl Command for OpenScene {
    fn name(&self) -> &'static str {
        "openScene"
    }

    fn should_record_undo(&self) -> bool {
        false
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let snapshot: NodeSnapshot = args.require("scene")?;
        if snapshot.kind != NodeKind::Scene {
            return Err(CommandError::invalid(
                "scene",
                format!("root must be a scene, got {}", snapshot.kind),
            ));
        }
        let mut arena = SceneArena::new();
        let root = arena.restore(&snapshot);
        arena.set_root(root)?;
        ctx.replace_scene(arena);
        info!("scene opened with {} nodes", snapshot.len());
        Ok(json!({ "uuid": snapshot.uuid.to_string(), "nodes": snapshot.len() }))
    }
}

/// Appends the objects of a snapshot to the current scene (undoable).
///
/// A scene snapshot contributes its children; any other snapshot is
/// imported as one object. Objects already in the scene are skipped.
pub struct LoadScene;

impl Command for LoadScene {
    fn name(&self) -> &'static str {
        "loadScene"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let Some(root) = ctx.require_scene(self.name()) else {
            return Ok(JsonValue::Null);
        };
        let snapshot: NodeSnapshot = args.require("scene")?;
        let objects = match snapshot.kind {
            NodeKind::Scene => snapshot.children,
            _ => vec![snapshot],
        };

        let mut present: HashSet<Uuid> = ctx.arena().descendants(root).map(|(_, node)| node.uuid).collect();
        let mut tracked = ctx.tracked();
        let mut loaded = Vec::new();
        for object in &objects {
            if !present.insert(object.uuid) {
                warn!("skipping {}: already in scene", object.uuid);
                continue;
            }
            loaded.push(tracked.arena_mut().restore(object));
        }
        tracked.push(root, &loaded)?;

        for &id in &loaded {
            ctx.rebuild(id);
        }
        info!("loaded {} of {} objects", loaded.len(), objects.len());
        Ok(json!({
            "loaded": loaded.iter().map(|&id| describe(ctx.arena(), id)).collect::<Vec<_>>(),
            "skipped": objects.len() - loaded.len(),
        }))
    }
}

/// Exports the current scene as a snapshot.
pub struct SaveSceneToLocal;

impl Command for SaveSceneToLocal {
    fn name(&self) -> &'static str {
        "saveSceneToLocal"
    }

    fn should_record_undo(&self) -> bool {
        false
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, _args: &CommandArgs) -> CommandResult<JsonValue> {
        if ctx.require_scene(self.name()).is_none() {
            return Ok(JsonValue::Null);
        }
        match ctx.workspace().snapshot()? {
            Some(snapshot) => serde_json::to_value(&snapshot)
                .map_err(|e| CommandError::invalid("scene", e.to_string())),
            None => Ok(JsonValue::Null),
        }
    }
}
