//! Mutation interceptor: explicit, recording mutation API over the scene arena
//!
//! Nodes become observable once wrapped. Every write or structural edit made
//! through [`Tracked`] on a wrapped owner is reported to the transaction
//! manager before the call returns; edits on unwrapped owners go unrecorded.

use std::collections::HashSet;

use tracing::{debug, instrument, trace};

use crate::domain::{DomainError, DomainResult, NodeId, PropertyPath, SceneArena, SceneNode, Value};
use crate::history::change::ChangeRecord;
use crate::history::transaction::TransactionManager;

/// Result of a wrap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapOutcome {
    /// Number of nodes newly wrapped in the subtree
    Wrapped(usize),
    AlreadyWrapped,
    /// Missing node or a kind that opts out of interception
    NotWrappable,
}

/// Identity-keyed registry of wrapped nodes.
#[derive(Debug, Default, Clone)]
pub struct Interceptor {
    wrapped: HashSet<NodeId>,
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `id` and, transitively, every wrappable descendant.
    ///
    /// Idempotent: wrapped nodes are returned as is. Subtrees under a
    /// non-wrappable node are left alone.
    #[instrument(level = "trace", skip(self, arena))]
    pub fn wrap(&mut self, arena: &SceneArena, id: NodeId) -> WrapOutcome {
        let Some(node) = arena.get(id) else {
            return WrapOutcome::NotWrappable;
        };
        if !node.kind.is_wrappable() {
            return WrapOutcome::NotWrappable;
        }
        if self.wrapped.contains(&id) {
            return WrapOutcome::AlreadyWrapped;
        }

        let mut visiting = HashSet::new();
        let mut stack = vec![id];
        let mut count = 0;
        while let Some(current) = stack.pop() {
            if !visiting.insert(current) || self.wrapped.contains(&current) {
                continue;
            }
            let Some(node) = arena.get(current) else {
                continue;
            };
            if !node.kind.is_wrappable() {
                trace!("skipping non-wrappable {}", node);
                continue;
            }
            self.wrapped.insert(current);
            count += 1;
            stack.extend(node.children.iter().rev());
        }
        debug!("wrapped {} nodes under {:?}", count, id);
        WrapOutcome::Wrapped(count)
    }

    pub fn is_wrapped(&self, id: NodeId) -> bool {
        self.wrapped.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.wrapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrapped.is_empty()
    }

    /// Forgets every wrapper, e.g. when the scene root is replaced.
    pub fn reset(&mut self) {
        self.wrapped.clear();
    }
}

/// Recording view over the scene used by commands.
pub struct Tracked<'a> {
    arena: &'a mut SceneArena,
    interceptor: &'a mut Interceptor,
    recorder: &'a mut TransactionManager,
}

impl<'a> Tracked<'a> {
    pub fn new(
        arena: &'a mut SceneArena,
        interceptor: &'a mut Interceptor,
        recorder: &'a mut TransactionManager,
    ) -> Self {
        Self {
            arena,
            interceptor,
            recorder,
        }
    }

    pub fn arena(&self) -> &SceneArena {
        self.arena
    }

    /// Raw arena access for building detached objects; nothing is recorded.
    pub fn arena_mut(&mut self) -> &mut SceneArena {
        self.arena
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.arena.get(id)
    }

    pub fn is_wrapped(&self, id: NodeId) -> bool {
        self.interceptor.is_wrapped(id)
    }

    fn records(&self, owner: NodeId) -> bool {
        self.recorder.is_batching() && self.interceptor.is_wrapped(owner)
    }

    // ------------------------------------------------------------
    // Property writes
    // ------------------------------------------------------------

    /// Assigns a top-level property and returns the previous value.
    pub fn set(&mut self, id: NodeId, key: &str, value: impl Into<Value>) -> DomainResult<Option<Value>> {
        self.write(id, &PropertyPath::new(key), Some(value.into()))
    }

    /// Assigns a nested field of an object-valued property.
    pub fn set_path(&mut self, id: NodeId, path: &PropertyPath, value: Value) -> DomainResult<Option<Value>> {
        self.write(id, path, Some(value))
    }

    /// Removes a property.
    pub fn unset(&mut self, id: NodeId, path: &PropertyPath) -> DomainResult<Option<Value>> {
        self.write(id, path, None)
    }

    fn write(&mut self, id: NodeId, path: &PropertyPath, value: Option<Value>) -> DomainResult<Option<Value>> {
        let old = self.arena.node_mut(id)?.put(id, path, value.clone())?;
        if old != value && !path.is_untracked() && self.records(id) {
            self.recorder.record(ChangeRecord::Modify {
                target: id,
                property: path.clone(),
                old: old.clone(),
                new: value,
            });
        }
        Ok(old)
    }

    // ------------------------------------------------------------
    // Structural edits on `children`
    // ------------------------------------------------------------

    /// Appends `items`; returns the new length.
    #[instrument(level = "trace", skip(self))]
    pub fn push(&mut self, parent: NodeId, items: &[NodeId]) -> DomainResult<usize> {
        self.validate_items(parent, items, &[])?;
        let start = self.arena.children(parent).len();
        for (offset, &child) in items.iter().enumerate() {
            self.insert_at(parent, start + offset, child)?;
        }
        Ok(self.arena.children(parent).len())
    }

    /// Prepends `items` keeping their order; returns the new length.
    #[instrument(level = "trace", skip(self))]
    pub fn unshift(&mut self, parent: NodeId, items: &[NodeId]) -> DomainResult<usize> {
        self.validate_items(parent, items, &[])?;
        for (index, &child) in items.iter().enumerate() {
            self.insert_at(parent, index, child)?;
        }
        Ok(self.arena.children(parent).len())
    }

    /// Removes `delete_count` children at `start`, then inserts `items` there.
    ///
    /// `delete_count` is clamped to the available children. Returns the
    /// removed children in their original order.
    #[instrument(level = "trace", skip(self))]
    pub fn splice(
        &mut self,
        parent: NodeId,
        start: usize,
        delete_count: usize,
        items: &[NodeId],
    ) -> DomainResult<Vec<NodeId>> {
        let len = self.arena.node(parent)?.children.len();
        if start > len {
            return Err(DomainError::IndexOutOfRange {
                parent,
                index: start,
                len,
            });
        }
        let delete_count = delete_count.min(len - start);
        let released = self.arena.children(parent)[start..start + delete_count].to_vec();
        self.validate_items(parent, items, &released)?;

        let mut removed = Vec::with_capacity(delete_count);
        for _ in 0..delete_count {
            let child = self.arena.detach(parent, start)?;
            if self.records(parent) {
                self.recorder.record(ChangeRecord::Remove {
                    parent,
                    index: start,
                    child,
                });
            }
            removed.push(child);
        }
        for (offset, &child) in items.iter().enumerate() {
            self.insert_at(parent, start + offset, child)?;
        }
        Ok(removed)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> DomainResult<()> {
        self.push(parent, &[child]).map(|_| ())
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomainResult<()> {
        self.splice(parent, index, 0, &[child]).map(|_| ())
    }

    /// Detaches `child` from `parent`; false if it is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomainResult<bool> {
        match self.arena.index_of(parent, child) {
            Some(index) => {
                self.splice(parent, index, 1, &[])?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Detaches `node` from its parent, if any.
    pub fn remove(&mut self, node: NodeId) -> DomainResult<bool> {
        match self.arena.node(node)?.parent {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(false),
        }
    }

    /// Moves `node` under `new_parent` at `index` (remove then insert).
    pub fn move_to(&mut self, node: NodeId, new_parent: NodeId, index: usize) -> DomainResult<()> {
        if self.arena.is_ancestor(node, new_parent) {
            return Err(DomainError::CycleDetected {
                parent: new_parent,
                child: node,
            });
        }
        self.remove(node)?;
        self.insert_child(new_parent, index, node)
    }

    fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomainResult<()> {
        self.arena.attach(parent, index, child)?;
        if self.records(parent) {
            self.recorder.record(ChangeRecord::Add {
                parent,
                index,
                child,
            });
        }
        if self.interceptor.is_wrapped(parent) {
            self.interceptor.wrap(self.arena, child);
        }
        Ok(())
    }

    /// Rejects the whole edit before anything is mutated or recorded.
    ///
    /// Children in `released` are about to be detached from `parent`, so they
    /// may be inserted again.
    fn validate_items(&self, parent: NodeId, items: &[NodeId], released: &[NodeId]) -> DomainResult<()> {
        self.arena.node(parent)?;
        let mut seen = HashSet::new();
        for &child in items {
            let node = self.arena.node(child)?;
            if let Some(current) = node.parent.filter(|_| !released.contains(&child)) {
                return Err(DomainError::AlreadyAttached {
                    child,
                    parent: current,
                });
            }
            if !seen.insert(child) {
                return Err(DomainError::AlreadyAttached { child, parent });
            }
            if self.arena.is_ancestor(child, parent) {
                return Err(DomainError::CycleDetected { parent, child });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeKind;

    #[test]
    fn given_helper_subtree_when_wrapping_root_then_helper_skipped() {
        let mut arena = SceneArena::with_scene_root();
        let root = arena.root().unwrap();
        let helper = arena.insert(SceneNode::new(NodeKind::Helper));
        let under_helper = arena.insert(SceneNode::new(NodeKind::Line));
        arena.attach(root, 0, helper).unwrap();
        arena.attach(helper, 0, under_helper).unwrap();

        let mut interceptor = Interceptor::new();
        assert_eq!(interceptor.wrap(&arena, root), WrapOutcome::Wrapped(1));
        assert!(!interceptor.is_wrapped(helper));
        assert!(!interceptor.is_wrapped(under_helper));
        assert_eq!(interceptor.wrap(&arena, root), WrapOutcome::AlreadyWrapped);
        assert_eq!(interceptor.wrap(&arena, helper), WrapOutcome::NotWrappable);
    }
}
