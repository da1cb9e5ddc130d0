//! Constructors for design objects.
//!
//! Objects are built detached in the arena (untracked); attaching the finished
//! subtree through the interceptor is what gets historized, as a single Add.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::arena::{NodeId, SceneArena, SceneNode};
use crate::domain::entities::{FurnitureInfo, NodeKind, OpeningType, Point3, Value};

/// Default dimensions for newly created objects, in millimetres.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObjectDefaults {
    pub wall_thickness: f64,
    pub wall_height: f64,
    pub wall_length: f64,
    pub door_width: f64,
    pub door_height: f64,
    pub door_thickness: f64,
    pub ground_width: f64,
    pub ground_depth: f64,
}

impl Default for ObjectDefaults {
    fn default() -> Self {
        Self {
            wall_thickness: 120.0,
            wall_height: 2800.0,
            wall_length: 4000.0,
            door_width: 900.0,
            door_height: 2100.0,
            door_thickness: 100.0,
            ground_width: 4000.0,
            ground_depth: 3000.0,
        }
    }
}

/// Point-valued properties that move with their object.
pub const POSITIONAL_PROPS: [&str; 3] = ["position", "start_point", "end_point"];

fn base(kind: NodeKind, name: &str) -> SceneNode {
    SceneNode::new(kind)
        .with_prop("name", name)
        .with_prop("is_visible", true)
        .with_prop("user_data", Value::Map(BTreeMap::new()))
}

pub fn wall(start: Point3, end: Point3, thickness: f64, height: f64) -> SceneNode {
    base(NodeKind::Wall, "wall")
        .with_prop("start_point", start)
        .with_prop("end_point", end)
        .with_prop("thickness", thickness)
        .with_prop("height", height)
}

pub fn opening(
    opening_type: OpeningType,
    width: f64,
    height: f64,
    thickness: f64,
    elevation: f64,
    position: Point3,
) -> SceneNode {
    base(NodeKind::Opening, opening_type.as_str())
        .with_prop("opening_type", opening_type)
        .with_prop("length", width)
        .with_prop("height", height)
        .with_prop("thickness", thickness)
        .with_prop("elevation", elevation)
        .with_prop("position", position)
}

pub fn furniture(info: FurnitureInfo, position: Point3) -> SceneNode {
    let name = info.name.clone();
    base(NodeKind::Furniture, &name)
        .with_prop("furniture", info.to_value())
        .with_prop("position", position)
}

pub fn line(start: Point3, end: Point3) -> SceneNode {
    base(NodeKind::Line, "line")
        .with_prop("start_point", start)
        .with_prop("end_point", end)
        .with_prop("radius", 0.0)
        .with_prop("is_arc", false)
}

/// Builds a composite line through `points` as a detached subtree.
pub fn composite_line(arena: &mut SceneArena, points: &[Point3], closed: bool) -> NodeId {
    let outline = arena.insert(base(NodeKind::CompositeLine, "outline").with_prop("is_closed", closed));
    let mut segments: Vec<(Point3, Point3)> = points.windows(2).map(|w| (w[0], w[1])).collect();
    if closed {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if first != last {
                segments.push((*last, *first));
            }
        }
    }
    for (start, end) in segments {
        let segment = arena.insert(line(start, end));
        let index = arena.children(outline).len();
        // fresh nodes: attach cannot fail
        let _ = arena.attach(outline, index, segment);
    }
    outline
}

/// Builds a ground plane with a closed outline as a detached subtree.
pub fn ground(arena: &mut SceneArena, outline: &[Point3]) -> NodeId {
    let ground = arena.insert(base(NodeKind::Ground, "ground"));
    let line = composite_line(arena, outline, true);
    let _ = arena.attach(ground, 0, line);
    ground
}

/// Axis-aligned rectangle outline starting at the origin.
pub fn rectangle(width: f64, depth: f64) -> Vec<Point3> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(width, 0.0, 0.0),
        Point3::new(width, depth, 0.0),
        Point3::new(0.0, depth, 0.0),
    ]
}
