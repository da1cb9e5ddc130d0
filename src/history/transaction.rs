//! Transaction manager: batches change records and replays them for undo/redo
//!
//! Commits push onto the undo stack and invalidate the redo stack. Undo replays
//! a batch back-to-front applying each record's inverse; redo replays it
//! front-to-back applying each record directly. After a replay the affected
//! domain objects are handed to the rebuild notifier once each.

use std::mem;

use chrono::Utc;
use itertools::Itertools;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{DomainError, DomainResult, NodeId, SceneArena};
use crate::history::change::{Batch, ChangeRecord};
use crate::history::error::{HistoryError, HistoryResult};
use crate::history::notifier::RebuildNotifier;

/// Outcome of a successful undo or redo.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub label: String,
    /// Number of records replayed
    pub records: usize,
    /// Owners touched by the replay, first-touch order, root excluded
    pub affected: Vec<NodeId>,
    /// Owners actually handed to the rebuild hook
    pub rebuilt: usize,
}

#[derive(Debug, Default)]
pub struct TransactionManager {
    undo_stack: Vec<Batch>,
    redo_stack: Vec<Batch>,
    current: Batch,
    batching: bool,
    /// Maximum undo depth, 0 means unbounded
    limit: usize,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.enforce_limit();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_batching(&self) -> bool {
        self.batching
    }

    /// Opens a fresh batch; an open batch is discarded.
    pub fn start_batch(&mut self) {
        self.open(None);
    }

    pub fn start_named_batch(&mut self, label: impl Into<String>) {
        self.open(Some(label.into()));
    }

    fn open(&mut self, label: Option<String>) {
        if self.batching && !self.current.is_empty() {
            warn!(
                "discarding open batch {} with {} records",
                self.current.label(),
                self.current.len()
            );
        }
        self.current = Batch::new(label);
        self.batching = true;
    }

    /// Appends to the open batch; ignored unless batching.
    pub fn record(&mut self, change: ChangeRecord) -> bool {
        if !self.batching {
            return false;
        }
        debug!("record: {}", change);
        self.current.records.push(change);
        true
    }

    /// Closes the open batch. Non-empty batches are committed and the redo
    /// stack is cleared; returns whether a commit happened.
    #[instrument(level = "debug", skip(self))]
    pub fn end_batch(&mut self) -> bool {
        let mut batch = mem::take(&mut self.current);
        let was_batching = mem::replace(&mut self.batching, false);
        if !was_batching || batch.is_empty() {
            debug!("nothing to commit");
            return false;
        }
        batch.committed_at = Some(Utc::now());
        info!("commit {} ({} records)", batch.label(), batch.len());
        self.undo_stack.push(batch);
        self.redo_stack.clear();
        self.enforce_limit();
        true
    }

    /// Closes the open batch and reverts everything it recorded.
    ///
    /// Nothing is committed and no rebuild is triggered. Returns the number
    /// of records reverted.
    #[instrument(level = "debug", skip(self, arena))]
    pub fn abort_batch(&mut self, arena: &mut SceneArena) -> HistoryResult<usize> {
        let batch = mem::take(&mut self.current);
        self.batching = false;
        if batch.is_empty() {
            return Ok(0);
        }
        warn!("rolling back {} ({} records)", batch.label(), batch.len());
        revert(arena, &batch).map_err(|source| HistoryError::Replay {
            label: batch.label().to_string(),
            source,
        })?;
        Ok(batch.len())
    }

    /// Reverts the most recent committed batch.
    ///
    /// Empty undo stack is a no-op returning `Ok(None)`.
    #[instrument(level = "debug", skip(self, arena, notifier))]
    pub fn undo(
        &mut self,
        arena: &mut SceneArena,
        notifier: &RebuildNotifier,
    ) -> HistoryResult<Option<ReplayReport>> {
        if self.batching {
            return Err(HistoryError::BatchInProgress("undo"));
        }
        let Some(batch) = self.undo_stack.pop() else {
            debug!("undo stack empty");
            return Ok(None);
        };
        let label = batch.label().to_string();
        let affected = revert(arena, &batch).map_err(|source| {
            error!("undo of {} failed: {}", label, source);
            HistoryError::Replay {
                label: label.clone(),
                source,
            }
        })?;
        let records = batch.len();
        self.redo_stack.push(batch);
        let rebuilt = notifier.notify(arena, &affected);
        info!("undo {} ({} records, {} rebuilt)", label, records, rebuilt);
        Ok(Some(ReplayReport {
            label,
            records,
            affected,
            rebuilt,
        }))
    }

    /// Re-applies the most recently undone batch.
    ///
    /// Empty redo stack is a no-op returning `Ok(None)`.
    #[instrument(level = "debug", skip(self, arena, notifier))]
    pub fn redo(
        &mut self,
        arena: &mut SceneArena,
        notifier: &RebuildNotifier,
    ) -> HistoryResult<Option<ReplayReport>> {
        if self.batching {
            return Err(HistoryError::BatchInProgress("redo"));
        }
        let Some(batch) = self.redo_stack.pop() else {
            debug!("redo stack empty");
            return Ok(None);
        };
        let label = batch.label().to_string();
        let affected = replay(arena, &batch).map_err(|source| {
            error!("redo of {} failed: {}", label, source);
            HistoryError::Replay {
                label: label.clone(),
                source,
            }
        })?;
        let records = batch.len();
        self.undo_stack.push(batch);
        let rebuilt = notifier.notify(arena, &affected);
        info!("redo {} ({} records, {} rebuilt)", label, records, rebuilt);
        Ok(Some(ReplayReport {
            label,
            records,
            affected,
            rebuilt,
        }))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Records collected so far in the open batch.
    pub fn pending(&self) -> &[ChangeRecord] {
        &self.current.records
    }

    /// Labels of committed batches, most recent first.
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo_stack.iter().rev().map(Batch::label).collect()
    }

    pub fn redo_labels(&self) -> Vec<&str> {
        self.redo_stack.iter().rev().map(Batch::label).collect()
    }

    /// Drops all history, including an open batch.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = Batch::default();
        self.batching = false;
    }

    fn enforce_limit(&mut self) {
        if self.limit > 0 && self.undo_stack.len() > self.limit {
            let excess = self.undo_stack.len() - self.limit;
            self.undo_stack.drain(..excess);
            debug!("dropped {} oldest batches", excess);
        }
    }
}

/// Applies the inverse of every record, last to first.
fn revert(arena: &mut SceneArena, batch: &Batch) -> DomainResult<Vec<NodeId>> {
    for change in batch.records.iter().rev() {
        apply_inverse(arena, change)?;
    }
    Ok(affected_owners(arena, batch.records.iter().rev()))
}

/// Applies every record, first to last.
fn replay(arena: &mut SceneArena, batch: &Batch) -> DomainResult<Vec<NodeId>> {
    for change in &batch.records {
        apply(arena, change)?;
    }
    Ok(affected_owners(arena, batch.records.iter()))
}

fn apply(arena: &mut SceneArena, change: &ChangeRecord) -> DomainResult<()> {
    match change {
        ChangeRecord::Add {
            parent,
            index,
            child,
        } => arena.attach(*parent, *index, *child),
        ChangeRecord::Remove {
            parent,
            index,
            child,
        } => detach_expected(arena, *parent, *index, *child),
        ChangeRecord::Modify {
            target,
            property,
            new,
            ..
        } => arena
            .node_mut(*target)?
            .put(*target, property, new.clone())
            .map(|_| ()),
    }
}

fn apply_inverse(arena: &mut SceneArena, change: &ChangeRecord) -> DomainResult<()> {
    match change {
        ChangeRecord::Add {
            parent,
            index,
            child,
        } => detach_expected(arena, *parent, *index, *child),
        ChangeRecord::Remove {
            parent,
            index,
            child,
        } => arena.attach(*parent, *index, *child),
        ChangeRecord::Modify {
            target,
            property,
            old,
            ..
        } => arena
            .node_mut(*target)?
            .put(*target, property, old.clone())
            .map(|_| ()),
    }
}

fn detach_expected(arena: &mut SceneArena, parent: NodeId, index: usize, child: NodeId) -> DomainResult<()> {
    if arena.child_at(parent, index) != Some(child) {
        return Err(DomainError::ChildMismatch {
            parent,
            index,
            child,
        });
    }
    arena.detach(parent, index).map(|_| ())
}

/// Distinct owners of `records` in first-touch order, excluding the scene root.
pub fn affected_owners<'a>(
    arena: &SceneArena,
    records: impl Iterator<Item = &'a ChangeRecord>,
) -> Vec<NodeId> {
    records
        .map(ChangeRecord::owner)
        .unique()
        .filter(|&owner| {
            arena.root() != Some(owner) && arena.get(owner).map_or(true, |n| !n.kind.is_root())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeKind, PropertyPath, SceneNode, Value};

    fn modify(target: NodeId, key: &str, old: Option<f64>, new: Option<f64>) -> ChangeRecord {
        ChangeRecord::Modify {
            target,
            property: PropertyPath::new(key),
            old: old.map(Value::from),
            new: new.map(Value::from),
        }
    }

    #[test]
    fn given_no_batch_when_recording_then_ignored() {
        let mut tm = TransactionManager::new();
        let arena = SceneArena::with_scene_root();
        let root = arena.root().unwrap();
        assert!(!tm.record(modify(root, "x", None, Some(1.0))));
        assert!(!tm.end_batch());
        assert!(!tm.can_undo());
    }

    #[test]
    fn given_limit_when_committing_past_it_then_oldest_dropped() {
        let mut arena = SceneArena::with_scene_root();
        let wall = arena.insert(SceneNode::new(NodeKind::Wall));
        let mut tm = TransactionManager::with_limit(2);
        for i in 0..3 {
            tm.start_named_batch(format!("b{i}"));
            tm.record(modify(wall, "x", None, Some(i as f64)));
            tm.end_batch();
        }
        assert_eq!(tm.undo_labels(), vec!["b2", "b1"]);
    }

    #[test]
    fn given_batching_when_undo_then_batch_in_progress() {
        let mut arena = SceneArena::with_scene_root();
        let mut tm = TransactionManager::new();
        tm.start_batch();
        let err = tm.undo(&mut arena, &RebuildNotifier::silent()).unwrap_err();
        assert_eq!(err, HistoryError::BatchInProgress("undo"));
    }

    #[test]
    fn given_root_and_repeated_owner_when_collecting_then_distinct_without_root() {
        let mut arena = SceneArena::with_scene_root();
        let root = arena.root().unwrap();
        let wall = arena.insert(SceneNode::new(NodeKind::Wall));
        let records = [
            modify(wall, "a", None, Some(1.0)),
            ChangeRecord::Add {
                parent: root,
                index: 0,
                child: wall,
            },
            modify(wall, "b", None, Some(2.0)),
        ];
        assert_eq!(affected_owners(&arena, records.iter()), vec![wall]);
    }
}
