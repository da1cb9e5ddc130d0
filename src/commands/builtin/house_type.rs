//! House-type commands: walls, ground, rooms, doors

use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::commands::builtin::describe;
use crate::commands::{Command, CommandArgs, CommandContext, CommandError, CommandResult};
use crate::domain::objects;
use crate::domain::{NodeKind, OpeningType, Point3};

fn positive(key: &str, value: f64) -> CommandResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CommandError::invalid(key, format!("must be positive, got {value}")))
    }
}

pub struct CreateOneWall;

impl Command for CreateOneWall {
    fn name(&self) -> &'static str {
        "createOneWall"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let defaults = ctx.defaults().clone();
        let start = args.or("start", Point3::ORIGIN)?;
        let end = args.or("end", Point3::new(defaults.wall_length, 0.0, 0.0))?;
        let thickness = positive("thickness", args.or("thickness", defaults.wall_thickness)?)?;
        let height = positive("height", args.or("height", defaults.wall_height)?)?;

        let Some(root) = ctx.require_scene(self.name()) else {
            return Ok(JsonValue::Null);
        };
        let mut tracked = ctx.tracked();
        let wall = tracked
            .arena_mut()
            .insert(objects::wall(start, end, thickness, height));
        tracked.add_child(root, wall)?;
        ctx.rebuild(wall);
        info!("wall created and added to the scene");
        Ok(describe(ctx.arena(), wall))
    }
}

pub struct CreateGround;

impl Command for CreateGround {
    fn name(&self) -> &'static str {
        "createGround"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let outline = match args.get_as::<Vec<Point3>>("outline")? {
            Some(points) if points.len() < 3 => {
                return Err(CommandError::invalid("outline", "needs at least 3 points"));
            }
            Some(points) => points,
            None => {
                let defaults = ctx.defaults();
                let width = positive("width", args.or("width", defaults.ground_width)?)?;
                let depth = positive("depth", args.or("depth", defaults.ground_depth)?)?;
                objects::rectangle(width, depth)
            }
        };

        let Some(root) = ctx.require_scene(self.name()) else {
            return Ok(JsonValue::Null);
        };
        let mut tracked = ctx.tracked();
        let ground = objects::ground(tracked.arena_mut(), &outline);
        tracked.add_child(root, ground)?;
        ctx.rebuild(ground);
        info!("ground created and added to the scene");
        Ok(describe(ctx.arena(), ground))
    }
}

/// Four walls around a rectangular ground, origin at the lower left.
pub struct CreateRectangularRoom;

impl Command for CreateRectangularRoom {
    fn name(&self) -> &'static str {
        "createRectangularRoom"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let defaults = ctx.defaults().clone();
        let width = positive("width", args.or("width", defaults.wall_length)?)?;
        let depth = positive("depth", args.or("depth", defaults.wall_length)?)?;
        let t = positive("thickness", args.or("thickness", defaults.wall_thickness)?)?;
        let height = positive("height", args.or("height", defaults.wall_height)?)?;

        let Some(root) = ctx.require_scene(self.name()) else {
            return Ok(JsonValue::Null);
        };

        // wall axes sit half a thickness outside the floor outline
        let half = t / 2.0;
        let segments = [
            (Point3::new(-half, 0.0, 0.0), Point3::new(-half, depth, 0.0)),
            (
                Point3::new(width + half, 0.0, 0.0),
                Point3::new(width + half, depth, 0.0),
            ),
            (
                Point3::new(0.0, depth + half, 0.0),
                Point3::new(width, depth + half, 0.0),
            ),
            (Point3::new(0.0, -half, 0.0), Point3::new(width, -half, 0.0)),
        ];

        let mut tracked = ctx.tracked();
        let mut created: Vec<_> = segments
            .iter()
            .map(|&(start, end)| tracked.arena_mut().insert(objects::wall(start, end, t, height)))
            .collect();
        let ground = objects::ground(tracked.arena_mut(), &objects::rectangle(width, depth));
        created.push(ground);
        tracked.push(root, &created)?;

        for &id in &created {
            ctx.rebuild(id);
        }
        info!("rectangular room created");
        let walls: Vec<_> = created[..4].iter().map(|&id| describe(ctx.arena(), id)).collect();
        Ok(json!({ "walls": walls, "ground": describe(ctx.arena(), ground) }))
    }
}

/// Hosts a door on the selected wall.
pub struct CreateSingleDoor;

impl Command for CreateSingleDoor {
    fn name(&self) -> &'static str {
        "createSingleDoor"
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue> {
        let defaults = ctx.defaults().clone();
        let opening_type = args.or("type", OpeningType::SingleDoor)?;
        let width = positive("width", args.or("width", defaults.door_width)?)?;
        let height = positive("height", args.or("height", defaults.door_height)?)?;
        let thickness = positive("thickness", args.or("thickness", defaults.door_thickness)?)?;
        let elevation = args.or("elevation", 0.0)?;
        let position = args.get_as::<Point3>("position")?;

        if ctx.require_scene(self.name()).is_none() {
            return Ok(JsonValue::Null);
        }
        let wall = match ctx.selection() {
            Some(id) if ctx.arena().get(id).map(|n| n.kind) == Some(NodeKind::Wall) => id,
            _ => {
                warn!("no wall selected or the selected object is not a wall");
                return Ok(JsonValue::Null);
            }
        };

        // docked at the wall's midpoint unless placed explicitly
        let position = match position {
            Some(p) => p,
            None => {
                let node = ctx.arena().node(wall)?;
                let point = |key: &str| node.props.get(key).and_then(|v| v.as_point());
                match (point("start_point"), point("end_point")) {
                    (Some(start), Some(end)) => start.midpoint(&end),
                    _ => Point3::ORIGIN,
                }
            }
        };

        let mut tracked = ctx.tracked();
        let door = tracked.arena_mut().insert(objects::opening(
            opening_type,
            width,
            height,
            thickness,
            elevation,
            position,
        ));
        tracked.add_child(wall, door)?;
        ctx.rebuild(door);
        info!("door created and mounted to the selected wall");
        Ok(describe(ctx.arena(), door))
    }
}
