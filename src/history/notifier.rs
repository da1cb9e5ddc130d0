//! Rebuild notification after undo/redo

use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::domain::{NodeId, SceneArena, SceneNode};

/// Regenerates the derived representation of a domain object.
///
/// Implementations must be idempotent: the notifier may hand over the same
/// object again on the next replay.
pub trait RebuildHook: Send + Sync {
    fn rebuild(&self, id: NodeId, node: &SceneNode);
}

/// Hook that does nothing; for headless sessions and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRebuildHook;

impl RebuildHook for NoopRebuildHook {
    fn rebuild(&self, _id: NodeId, _node: &SceneNode) {}
}

#[derive(Clone)]
pub struct RebuildNotifier {
    hook: Arc<dyn RebuildHook>,
}

impl fmt::Debug for RebuildNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebuildNotifier").finish_non_exhaustive()
    }
}

impl Default for RebuildNotifier {
    fn default() -> Self {
        Self::silent()
    }
}

impl RebuildNotifier {
    pub fn new(hook: Arc<dyn RebuildHook>) -> Self {
        Self { hook }
    }

    pub fn silent() -> Self {
        Self::new(Arc::new(NoopRebuildHook))
    }

    /// Rebuilds each distinct owner once, skipping kinds that cannot rebuild
    /// and nodes outside the scene. Returns the number of rebuilds.
    pub fn notify(&self, arena: &SceneArena, owners: &[NodeId]) -> usize {
        let count = owners
            .iter()
            .copied()
            .unique()
            .filter(|&id| arena.in_scene(id))
            .filter_map(|id| arena.get(id).map(|node| (id, node)))
            .filter(|(_, node)| node.kind.can_rebuild())
            .map(|(id, node)| {
                trace!("rebuild {}", node);
                self.hook.rebuild(id, node)
            })
            .count();
        debug!("rebuilt {} of {} owners", count, owners.len());
        count
    }

    /// Rebuilds a single object; false if it was skipped.
    pub fn rebuild_one(&self, arena: &SceneArena, id: NodeId) -> bool {
        self.notify(arena, &[id]) == 1
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::NodeKind;

    #[derive(Default)]
    struct Counting(Mutex<Vec<NodeId>>);

    impl RebuildHook for Counting {
        fn rebuild(&self, id: NodeId, _node: &SceneNode) {
            self.0.lock().unwrap().push(id);
        }
    }

    #[test]
    fn given_duplicates_and_root_when_notifying_then_each_rebuildable_once() {
        let mut arena = SceneArena::with_scene_root();
        let root = arena.root().unwrap();
        let wall = arena.insert(SceneNode::new(NodeKind::Wall));
        let helper = arena.insert(SceneNode::new(NodeKind::Helper));
        arena.attach(root, 0, wall).unwrap();
        arena.attach(root, 1, helper).unwrap();
        let hook = Arc::new(Counting::default());
        let notifier = RebuildNotifier::new(hook.clone());

        let count = notifier.notify(&arena, &[wall, root, helper, wall]);

        assert_eq!(count, 1);
        assert_eq!(*hook.0.lock().unwrap(), vec![wall]);
    }

    #[test]
    fn given_detached_wall_when_notifying_then_skipped() {
        let mut arena = SceneArena::with_scene_root();
        let root = arena.root().unwrap();
        let kept = arena.insert(SceneNode::new(NodeKind::Wall));
        let detached = arena.insert(SceneNode::new(NodeKind::Wall));
        arena.attach(root, 0, kept).unwrap();
        let hook = Arc::new(Counting::default());
        let notifier = RebuildNotifier::new(hook.clone());

        let count = notifier.notify(&arena, &[detached, kept]);

        assert_eq!(count, 1);
        assert_eq!(*hook.0.lock().unwrap(), vec![kept]);
        assert!(!notifier.rebuild_one(&arena, detached));
    }
}
