//! Built-in commands, registered under the names scripts use

pub mod edit_object;
pub mod file;
pub mod furniture;
pub mod house_type;

use serde_json::{json, Value as JsonValue};

use crate::commands::registry::CommandRegistry;
use crate::domain::{NodeId, SceneArena};

pub fn register_all(registry: &mut CommandRegistry) {
    registry.register("newFile", || Box::new(file::NewFile));
    registry.register("openScene", || Box::new(file::OpenScene));
    registry.register("loadScene", || Box::new(file::LoadScene));
    registry.register("saveSceneToLocal", || Box::new(file::SaveSceneToLocal));

    registry.register("createOneWall", || Box::new(house_type::CreateOneWall));
    registry.register("createGround", || Box::new(house_type::CreateGround));
    registry.register("createRectangularRoom", || {
        Box::new(house_type::CreateRectangularRoom)
    });
    registry.register("createSingleDoor", || Box::new(house_type::CreateSingleDoor));

    registry.register("insertFurniture", || Box::new(furniture::InsertFurniture));

    registry.register("selectObject", || Box::new(edit_object::SelectObject));
    registry.register("deselectObject", || Box::new(edit_object::DeselectObject));
    registry.register("getSelectedObjectInfo", || {
        Box::new(edit_object::GetSelectedObjectInfo)
    });
    registry.register("deleteSelectedObject", || {
        Box::new(edit_object::DeleteSelectedObject)
    });
    registry.register("setObjectProperty", || Box::new(edit_object::SetObjectProperty));
    registry.register("moveObject", || Box::new(edit_object::MoveObject));
}

/// Identifies a node in command results.
fn describe(arena: &SceneArena, id: NodeId) -> JsonValue {
    match arena.get(id) {
        Some(node) => json!({ "uuid": node.uuid.to_string(), "kind": node.kind.as_str() }),
        None => JsonValue::Null,
    }
}
