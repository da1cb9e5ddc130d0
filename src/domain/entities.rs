//! Domain entities: node roles, property values and snapshots

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a node in the scene hierarchy.
///
/// Replaces runtime type-name checks: callers pattern match on the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Scene root; owns every top-level object
    Scene,
    Wall,
    /// Door or window hosted by a wall
    Opening,
    Furniture,
    Ground,
    /// Polyline made of `Line` children
    CompositeLine,
    Line,
    Plane,
    /// Renderer-native helper (guides, gizmos). Never intercepted, never rebuilt.
    Helper,
}

impl NodeKind {
    /// Whether the mutation interceptor may wrap nodes of this kind.
    pub fn is_wrappable(&self) -> bool {
        !matches!(self, NodeKind::Helper)
    }

    /// Whether nodes of this kind expose a rebuild capability.
    ///
    /// The scene root is rebuilt by its renderer, helpers have no derived state.
    pub fn can_rebuild(&self) -> bool {
        !matches!(self, NodeKind::Scene | NodeKind::Helper)
    }

    pub fn is_root(&self) -> bool {
        matches!(self, NodeKind::Scene)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Scene => "scene",
            NodeKind::Wall => "wall",
            NodeKind::Opening => "opening",
            NodeKind::Furniture => "furniture",
            NodeKind::Ground => "ground",
            NodeKind::CompositeLine => "composite_line",
            NodeKind::Line => "line",
            NodeKind::Plane => "plane",
            NodeKind::Helper => "helper",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point in scene space (millimetres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn translate(&self, offset: &Point3) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.z + offset.z)
    }

    pub fn midpoint(&self, other: &Point3) -> Self {
        Self::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Kinds of wall openings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningType {
    #[default]
    SingleDoor,
    DoubleDoor,
    MotherChildDoor,
    SlidingDoor,
    BalconyDoor,
    StraightWindow,
    BayWindow,
}

impl OpeningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpeningType::SingleDoor => "single_door",
            OpeningType::DoubleDoor => "double_door",
            OpeningType::MotherChildDoor => "mother_child_door",
            OpeningType::SlidingDoor => "sliding_door",
            OpeningType::BalconyDoor => "balcony_door",
            OpeningType::StraightWindow => "straight_window",
            OpeningType::BayWindow => "bay_window",
        }
    }
}

/// Catalogue reference of a furniture item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FurnitureInfo {
    pub db_id: String,
    pub name: String,
    pub gltf_url: String,
}

impl FurnitureInfo {
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("db_id".to_string(), Value::Text(self.db_id.clone()));
        map.insert("name".to_string(), Value::Text(self.name.clone()));
        map.insert("gltf_url".to_string(), Value::Text(self.gltf_url.clone()));
        Value::Map(map)
    }
}

/// Property value stored on a node.
///
/// `Map` values are object-valued members: nested fields are addressed
/// through a [`PropertyPath`] and tracked like top-level properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Point(Point3),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point3> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Converts a JSON argument into a property value.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        serde_json::from_value(json.clone()).ok()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Point(p) => write!(f, "{p}"),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Map(m) => write!(f, "{{{} fields}}", m.len()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Point3> for Value {
    fn from(p: Point3) -> Self {
        Value::Point(p)
    }
}

impl From<OpeningType> for Value {
    fn from(t: OpeningType) -> Self {
        Value::Text(t.as_str().to_string())
    }
}

/// Dotted address of a (possibly nested) property, e.g. `furniture.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    pub fn new(key: impl Into<String>) -> Self {
        Self(vec![key.into()])
    }

    /// Parses a dotted path. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn root(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent back-references and `__` bookkeeping markers are never historized.
    pub fn is_untracked(&self) -> bool {
        self.0
            .iter()
            .any(|s| s == "parent" || s.starts_with("__"))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for PropertyPath {
    fn from(s: &str) -> Self {
        PropertyPath::parse(s)
    }
}

/// Serializable mirror of a subtree, used for scene import/export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub uuid: Uuid,
    pub kind: NodeKind,
    #[serde(default)]
    pub props: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Number of nodes in this subtree, including itself.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(NodeSnapshot::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_dotted_path_when_parsing_then_splits_segments() {
        let path = PropertyPath::parse("furniture.name");
        assert_eq!(path.segments(), &["furniture".to_string(), "name".to_string()]);
        assert_eq!(path.root(), "furniture");
        assert_eq!(path.to_string(), "furniture.name");
    }

    #[test]
    fn given_bookkeeping_keys_when_checking_then_untracked() {
        assert!(PropertyPath::parse("parent").is_untracked());
        assert!(PropertyPath::parse("__is_proxy").is_untracked());
        assert!(PropertyPath::parse("user_data.__marker").is_untracked());
        assert!(!PropertyPath::parse("thickness").is_untracked());
    }

    #[test]
    fn given_json_point_when_converting_then_yields_point_value() {
        let json = serde_json::json!({"x": 1.0, "y": 2.0, "z": 3.0});
        assert_eq!(
            Value::from_json(&json),
            Some(Value::Point(Point3::new(1.0, 2.0, 3.0)))
        );
    }

    #[test]
    fn given_json_array_when_converting_then_yields_list_value() {
        let json = serde_json::json!([1.0, 2.0, 3.0]);
        assert_eq!(
            Value::from_json(&json),
            Some(Value::List(vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Number(3.0)
            ]))
        );
    }

    #[test]
    fn given_kinds_when_querying_capabilities_then_root_and_helper_excluded() {
        assert!(!NodeKind::Scene.can_rebuild());
        assert!(!NodeKind::Helper.can_rebuild());
        assert!(!NodeKind::Helper.is_wrappable());
        assert!(NodeKind::Wall.can_rebuild());
        assert!(NodeKind::Scene.is_wrappable());
    }
}
