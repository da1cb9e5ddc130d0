use serde_json::Value as JsonValue;
use tracing::info;

use crate::commands::builtin::describe;
use crate::commands::{Command, CommandArgs, CommandContext, CommandResult};
use crate::domain::objects;
use crate::domain::{FurnitureInfo, Point3};

pub struct InsertFurniture;

impl Command for InsertFurniture {
    fn name(&self) -> &'static str {
        "insertFurniture"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let info = FurnitureInfo {
            db_id: args.or("db_id", String::new())?,
            name: args.require("name")?,
            gltf_url: args.or("gltf_url", String::new())?,
        };
        let position = args.or("position", Point3::ORIGIN)?;

        let Some(root) = ctx.require_scene(self.name()) else {
            return Ok(JsonValue::Null);
        };
        let mut tracked = ctx.tracked();
        let furniture = tracked.arena_mut().insert(objects::furniture(info, position));
        tracked.add_child(root, furniture)?;
        ctx.rebuild(furniture);
        info!("furniture inserted into the scene");
        Ok(describe(ctx.arena(), furniture))
    }
}
