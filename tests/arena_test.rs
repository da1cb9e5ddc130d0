//! Tests for the scene arena: structure, traversal and snapshots

use planscene::domain::{DomainError, NodeKind, PropertyPath, SceneArena, SceneNode, Value};

fn named(kind: NodeKind, name: &str) -> SceneNode {
    SceneNode::new(kind).with_prop("name", name)
}

#[test]
fn given_detached_node_when_attaching_then_parent_link_set() {
    // Arrange
    let mut arena = SceneArena::with_scene_root();
    let root = arena.root().unwrap();
    let wall = arena.insert(named(NodeKind::Wall, "w1"));

    // Act
    arena.attach(root, 0, wall).unwrap();

    // Assert
    assert_eq!(arena.parent(wall), Some(root));
    assert_eq!(arena.children(root), &[wall]);
    assert_eq!(arena.index_of(root, wall), Some(0));
}

#[test]
fn given_attached_node_when_attaching_elsewhere_then_rejected() {
    let mut arena = SceneArena::with_scene_root();
    let root = arena.root().unwrap();
    let wall = arena.insert(named(NodeKind::Wall, "w1"));
    let other = arena.insert(named(NodeKind::Wall, "w2"));
    arena.attach(root, 0, wall).unwrap();

    let err = arena.attach(other, 0, wall).unwrap_err();

    assert_eq!(
        err,
        DomainError::AlreadyAttached {
            child: wall,
            parent: root
        }
    );
    assert!(arena.children(other).is_empty());
}

#[test]
fn given_ancestor_when_attaching_under_descendant_then_cycle_detected() {
    let mut arena = SceneArena::new();
    let wall = arena.insert(named(NodeKind::Wall, "w"));
    let door = arena.insert(named(NodeKind::Opening, "d"));
    arena.attach(wall, 0, door).unwrap();

    let err = arena.attach(door, 0, wall).unwrap_err();

    assert_eq!(
        err,
        DomainError::CycleDetected {
            parent: door,
            child: wall
        }
    );
}

#[test]
fn given_index_past_end_when_attaching_then_out_of_range() {
    let mut arena = SceneArena::with_scene_root();
    let root = arena.root().unwrap();
    let wall = arena.insert(named(NodeKind::Wall, "w"));

    let err = arena.attach(root, 1, wall).unwrap_err();

    assert!(matches!(err, DomainError::IndexOutOfRange { index: 1, len: 0, .. }));
}

#[test]
fn given_detached_child_when_detaching_then_node_stays_in_arena() {
    let mut arena = SceneArena::with_scene_root();
    let root = arena.root().unwrap();
    let wall = arena.insert(named(NodeKind::Wall, "w"));
    arena.attach(root, 0, wall).unwrap();

    let removed = arena.detach(root, 0).unwrap();

    assert_eq!(removed, wall);
    assert!(arena.contains(wall));
    assert_eq!(arena.parent(wall), None);
    assert!(arena.children(root).is_empty());
}

#[test]
fn given_tree_when_traversing_then_preorder_and_postorder_match_structure() {
    // Arrange: root -> [wall -> [door], ground]
    let mut arena = SceneArena::with_scene_root();
    let root = arena.root().unwrap();
    let wall = arena.insert(named(NodeKind::Wall, "wall"));
    let door = arena.insert(named(NodeKind::Opening, "door"));
    let ground = arena.insert(named(NodeKind::Ground, "ground"));
    arena.attach(root, 0, wall).unwrap();
    arena.attach(wall, 0, door).unwrap();
    arena.attach(root, 1, ground).unwrap();

    // Act
    let pre: Vec<_> = arena.iter().map(|(id, _)| id).collect();
    let post: Vec<_> = arena.iter_postorder().map(|(id, _)| id).collect();

    // Assert
    assert_eq!(pre, vec![root, wall, door, ground]);
    assert_eq!(post, vec![door, wall, ground, root]);
    assert_eq!(arena.depth(), 3);
    assert!(arena.is_ancestor(root, door));
    assert!(!arena.is_ancestor(ground, door));
}

#[test]
fn given_subtree_when_snapshot_and_restore_then_structure_and_uuids_preserved() {
    // Arrange
    let mut arena = SceneArena::with_scene_root();
    let root = arena.root().unwrap();
    let wall = arena.insert(named(NodeKind::Wall, "wall").with_prop("thickness", 120.0));
    let door = arena.insert(named(NodeKind::Opening, "door"));
    arena.attach(root, 0, wall).unwrap();
    arena.attach(wall, 0, door).unwrap();

    // Act
    let snapshot = arena.snapshot(root).unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed = serde_json::from_str(&json).unwrap();
    let mut other = SceneArena::new();
    let restored = other.restore(&parsed);

    // Assert
    assert_eq!(snapshot.len(), 3);
    assert_eq!(other.snapshot(restored).unwrap(), snapshot);
    let restored_wall = other.children(restored)[0];
    assert_eq!(other.parent(restored_wall), Some(restored));
    assert_eq!(
        other.get(restored_wall).unwrap().get(&PropertyPath::new("thickness")),
        Some(&Value::Number(120.0))
    );
    assert!(other.find_by_uuid(arena.get(door).unwrap().uuid).is_some());
}

#[test]
fn given_missing_intermediate_when_putting_nested_then_property_not_found() {
    let mut arena = SceneArena::new();
    let sofa = arena.insert(SceneNode::new(NodeKind::Furniture));

    let err = arena
        .node_mut(sofa)
        .unwrap()
        .put(sofa, &PropertyPath::parse("furniture.name"), Some("sofa".into()))
        .unwrap_err();

    assert!(matches!(err, DomainError::PropertyNotFound { ref path, .. } if path == "furniture"));
}
