use std::collections::BTreeMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::entities::{NodeKind, NodeSnapshot, PropertyPath, Value};
use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a node in the scene arena.
pub type NodeId = Index;

/// Design object in the arena-based scene hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Persistent identity, survives export/import
    pub uuid: Uuid,
    /// Role of the node, drives wrapping and rebuild decisions
    pub kind: NodeKind,
    /// Scalar and object-valued properties
    pub props: BTreeMap<String, Value>,
    /// Non-owning back-reference, None for roots and detached nodes
    pub parent: Option<NodeId>,
    /// Owned children, insertion order significant
    pub children: Vec<NodeId>,
}

impl fmt::Display for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) if !name.is_empty() => write!(f, "{} {:?}", self.kind, name),
            _ => write!(f, "{} {}", self.kind, self.uuid.simple()),
        }
    }
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            props: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.props.get("name").and_then(Value::as_str)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.props.get(key).and_then(Value::as_f64)
    }

    /// Resolves a (possibly nested) property.
    pub fn get(&self, path: &PropertyPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.props.get(first)?;
        for segment in rest {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Writes a (possibly nested) property and returns the previous value.
    ///
    /// `None` removes the key. Intermediate segments must already be objects.
    pub fn put(
        &mut self,
        id: NodeId,
        path: &PropertyPath,
        value: Option<Value>,
    ) -> DomainResult<Option<Value>> {
        let (last, parents) = path.segments().split_last().ok_or(DomainError::EmptyPath)?;
        let mut map = &mut self.props;
        for (depth, segment) in parents.iter().enumerate() {
            let partial = path.segments()[..=depth].join(".");
            let next = map
                .get_mut(segment)
                .ok_or_else(|| DomainError::PropertyNotFound {
                    node: id,
                    path: partial.clone(),
                })?;
            map = next.as_map_mut().ok_or(DomainError::NotAnObject {
                node: id,
                path: partial,
            })?;
        }
        Ok(match value {
            Some(v) => map.insert(last.clone(), v),
            None => map.remove(last),
        })
    }
}

/// Arena-based scene hierarchy.
///
/// Nodes are never freed when detached: history records keep referring to
/// them by id so that undo can reattach the exact same subtree.
#[derive(Debug)]
pub struct SceneArena {
    /// Arena storage for all scene nodes
    arena: Arena<SceneNode>,
    /// Index of the scene root, None before a scene is created
    root: Option<NodeId>,
}

impl Default for SceneArena {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Creates an arena holding a fresh scene root.
    pub fn with_scene_root() -> Self {
        let mut arena = Self::new();
        let root = arena.insert(SceneNode::new(NodeKind::Scene));
        arena.root = Some(root);
        arena
    }

    /// Stores a detached node.
    #[instrument(level = "trace", skip(self, node), fields(kind = %node.kind))]
    pub fn insert(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        self.arena.insert(node)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) -> DomainResult<()> {
        if !self.arena.contains(root) {
            return Err(DomainError::NodeNotFound(root));
        }
        self.root = Some(root);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, idx: NodeId) -> bool {
        self.arena.contains(idx)
    }

    pub fn get(&self, idx: NodeId) -> Option<&SceneNode> {
        self.arena.get(idx)
    }

    pub fn get_mut(&mut self, idx: NodeId) -> Option<&mut SceneNode> {
        self.arena.get_mut(idx)
    }

    pub fn node(&self, idx: NodeId) -> DomainResult<&SceneNode> {
        self.arena.get(idx).ok_or(DomainError::NodeNotFound(idx))
    }

    pub fn node_mut(&mut self, idx: NodeId) -> DomainResult<&mut SceneNode> {
        self.arena.get_mut(idx).ok_or(DomainError::NodeNotFound(idx))
    }

    pub fn children(&self, idx: NodeId) -> &[NodeId] {
        self.arena
            .get(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, idx: NodeId) -> Option<NodeId> {
        self.arena.get(idx).and_then(|n| n.parent)
    }

    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).get(index).copied()
    }

    /// True if `ancestor` is `node` or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.parent(idx);
        }
        false
    }

    /// True if `idx` is reachable from the scene root.
    ///
    /// Detached nodes kept alive for history are not part of the scene.
    pub fn in_scene(&self, idx: NodeId) -> bool {
        self.root.is_some_and(|root| self.is_ancestor(root, idx))
    }

    pub fn find_by_uuid(&self, uuid: Uuid) -> Option<NodeId> {
        self.arena
            .iter()
            .find(|(_, node)| node.uuid == uuid)
            .map(|(idx, _)| idx)
    }

    /// Checks that `child` may be inserted at `index` of `parent`.
    pub fn check_attach(&self, parent: NodeId, index: usize, child: NodeId) -> DomainResult<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;
        if let Some(current) = child_node.parent {
            return Err(DomainError::AlreadyAttached {
                child,
                parent: current,
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(DomainError::CycleDetected { parent, child });
        }
        if index > parent_node.children.len() {
            return Err(DomainError::IndexOutOfRange {
                parent,
                index,
                len: parent_node.children.len(),
            });
        }
        Ok(())
    }

    /// Inserts `child` at `index` of `parent` and sets its back-reference.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomainResult<()> {
        self.check_attach(parent, index, child)?;
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Removes the child at `index` of `parent` and clears its back-reference.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, parent: NodeId, index: usize) -> DomainResult<NodeId> {
        let parent_node = self.node_mut(parent)?;
        let len = parent_node.children.len();
        if index >= len {
            return Err(DomainError::IndexOutOfRange { parent, index, len });
        }
        let child = parent_node.children.remove(index);
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = None;
        }
        Ok(child)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order traversal of the subtree rooted at `start`.
    pub fn descendants(&self, start: NodeId) -> TreeIterator {
        TreeIterator::new(self, Some(start))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: NodeId) -> usize {
        if let Some(node) = self.get(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Mirrors the subtree rooted at `idx`.
    pub fn snapshot(&self, idx: NodeId) -> DomainResult<NodeSnapshot> {
        let node = self.node(idx)?;
        let children = node
            .children
            .iter()
            .map(|&child| self.snapshot(child))
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(NodeSnapshot {
            uuid: node.uuid,
            kind: node.kind,
            props: node.props.clone(),
            children,
        })
    }

    /// Materializes a snapshot as a new detached subtree; uuids are preserved.
    #[instrument(level = "debug", skip(self, snapshot), fields(nodes = snapshot.len()))]
    pub fn restore(&mut self, snapshot: &NodeSnapshot) -> NodeId {
        let idx = self.arena.insert(SceneNode {
            uuid: snapshot.uuid,
            kind: snapshot.kind,
            props: snapshot.props.clone(),
            parent: None,
            children: Vec::new(),
        });
        for child in &snapshot.children {
            let child_idx = self.restore(child);
            if let Some(node) = self.arena.get_mut(child_idx) {
                node.parent = Some(idx);
            }
            if let Some(node) = self.arena.get_mut(idx) {
                node.children.push(child_idx);
            }
        }
        idx
    }
}

pub struct TreeIterator<'a> {
    arena: &'a SceneArena,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a SceneArena, start: Option<NodeId>) -> Self {
        Self {
            arena,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a SceneNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a SceneArena,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a SceneArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a SceneNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
