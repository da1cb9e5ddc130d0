//! Selection and object editing commands

use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::commands::builtin::describe;
use crate::commands::{Command, CommandArgs, CommandContext, CommandError, CommandResult};
use crate::domain::objects::POSITIONAL_PROPS;
use crate::domain::{NodeId, Point3, PropertyPath, Value};

fn info_of(ctx: &CommandContext<'_>, id: NodeId) -> CommandResult<JsonValue> {
    let snapshot = ctx.arena().snapshot(id)?;
    serde_json::to_value(&snapshot).map_err(|e| CommandError::invalid("uuid", e.to_string()))
}

pub struct SelectObject;

impl Command for SelectObject {
    fn name(&self) -> &'static str {
        "selectObject"
    }

    fn should_record_undo(&self) -> bool {
        false
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let uuid: String = args.require("uuid")?;
        let id = ctx.resolve(&uuid)?;
        ctx.select(id);
        Ok(describe(ctx.arena(), id))
    }
}

pub struct DeselectObject;

impl Command for DeselectObject {
    fn name(&self) -> &'static str {
        "deselectObject"
    }

    fn should_record_undo(&self) -> bool {
        false
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, _args: &CommandArgs) -> CommandResult<JsonValue> {
        Ok(match ctx.deselect() {
            Some(id) => describe(ctx.arena(), id),
            None => JsonValue::Null,
        })
    }
}

pub struct GetSelectedObjectInfo;

impl Command for GetSelectedObjectInfo {
    fn name(&self) -> &'static str {
        "getSelectedObjectInfo"
    }

    fn should_record_undo(&self) -> bool {
        false
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, _args: &CommandArgs) -> CommandResult<JsonValue> {
        match ctx.selection() {
            Some(id) => info_of(ctx, id),
            None => Ok(JsonValue::Null),
        }
    }
}

pub struct DeleteSelectedObject;

impl Command for DeleteSelectedObject {
    fn name(&self) -> &'static str {
        "deleteSelectedObject"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, _args: &CommandArgs) -> CommandResult<JsonValue> {
        let Some(id) = ctx.selection() else {
            warn!("no object selected");
            return Ok(JsonValue::Null);
        };
        let deleted = describe(ctx.arena(), id);
        let parent = ctx.arena().parent(id);
        if !ctx.tracked().remove(id)? {
            warn!("selected object is not attached");
            return Ok(JsonValue::Null);
        }
        ctx.deselect();
        if let Some(parent) = parent {
            ctx.rebuild(parent);
        }
        info!("selected object deleted");
        Ok(deleted)
    }
}

/// Writes one (possibly nested) property of the target object.
pub struct SetObjectProperty;

impl Command for SetObjectProperty {
    fn name(&self) -> &'static str {
        "setObjectProperty"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let raw_path: String = args.require("path")?;
        let path = PropertyPath::parse(&raw_path);
        if path.is_empty() {
            return Err(CommandError::invalid("path", "empty property path"));
        }
        if path.is_untracked() {
            return Err(CommandError::invalid("path", format!("{path} is not editable")));
        }
        let json = args
            .get("value")
            .ok_or_else(|| CommandError::invalid("value", "missing"))?;
        let value = Value::from_json(json)
            .ok_or_else(|| CommandError::invalid("value", format!("unsupported value {json}")))?;

        let Some(id) = ctx.target(args)? else {
            warn!("no target object for {}", path);
            return Ok(JsonValue::Null);
        };
        let old = ctx.tracked().set_path(id, &path, value)?;
        ctx.rebuild(id);
        Ok(json!({
            "uuid": ctx.arena().node(id)?.uuid.to_string(),
            "path": path.to_string(),
            "old": old.map_or(JsonValue::Null, |v| v.to_json()),
        }))
    }
}

/// Translates the target object and everything it hosts.
pub struct MoveObject;

impl Command for MoveObject {
    fn name(&self) -> &'static str {
        "moveObject"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let offset: Point3 = args.require("offset")?;
        let Some(id) = ctx.target(args)? else {
            warn!("no target object to move");
            return Ok(JsonValue::Null);
        };

        // intercepted nodes only
        let interceptor = &ctx.workspace().interceptor;
        let moves: Vec<(NodeId, &str, Point3)> = ctx
            .arena()
            .descendants(id)
            .filter(|&(node_id, _)| interceptor.is_wrapped(node_id))
            .flat_map(|(node_id, node)| {
                POSITIONAL_PROPS.iter().filter_map(move |&key| {
                    node.props
                        .get(key)
                        .and_then(Value::as_point)
                        .map(|p| (node_id, key, p.translate(&offset)))
                })
            })
            .collect();

        let mut tracked = ctx.tracked();
        for &(node_id, key, point) in &moves {
            tracked.set(node_id, key, point)?;
        }
        let rebuilt = ctx.workspace().notifier.notify(
            ctx.arena(),
            &moves.iter().map(|&(node_id, _, _)| node_id).collect::<Vec<_>>(),
        );
        info!("moved {} points, rebuilt {} objects", moves.len(), rebuilt);
        Ok(json!({ "moved": moves.len(), "rebuilt": rebuilt }))
    }
}
