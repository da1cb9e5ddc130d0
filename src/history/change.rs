//! Reversible change records and batches

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{NodeId, PropertyPath, Value};

/// A single reversible mutation.
///
/// Each record describes one elementary step that is valid against the
/// state immediately preceding it, so a batch replays back-to-front for
/// undo and front-to-back for redo.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeRecord {
    /// `child` was inserted at `index` of `parent.children`
    Add {
        parent: NodeId,
        index: usize,
        child: NodeId,
    },
    /// `child` was removed from `index` of `parent.children`
    Remove {
        parent: NodeId,
        index: usize,
        child: NodeId,
    },
    /// `target[property]` went from `old` to `new`; `None` means absent
    Modify {
        target: NodeId,
        property: PropertyPath,
        old: Option<Value>,
        new: Option<Value>,
    },
}

impl ChangeRecord {
    /// Domain object whose state this record changed.
    pub fn owner(&self) -> NodeId {
        match self {
            ChangeRecord::Add { parent, .. } | ChangeRecord::Remove { parent, .. } => *parent,
            ChangeRecord::Modify { target, .. } => *target,
        }
    }

    pub fn is_structural(&self) -> bool {
        !matches!(self, ChangeRecord::Modify { .. })
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeRecord::Add {
                parent,
                index,
                child,
            } => write!(f, "add {child:?} at {parent:?}[{index}]"),
            ChangeRecord::Remove {
                parent,
                index,
                child,
            } => write!(f, "remove {child:?} from {parent:?}[{index}]"),
            ChangeRecord::Modify {
                target,
                property,
                old,
                new,
            } => {
                let show = |v: &Option<Value>| v.as_ref().map_or("<unset>".to_string(), |v| v.to_string());
                write!(f, "modify {target:?}.{property}: {} -> {}", show(old), show(new))
            }
        }
    }
}

/// Ordered records produced by one logical operation, undone and redone as a unit.
#[derive(Debug, Clone)]
pub struct Batch {
    pub label: Option<String>,
    pub records: Vec<ChangeRecord>,
    pub committed_at: Option<DateTime<Utc>>,
}

impl Default for Batch {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Batch {
    pub fn new(label: Option<String>) -> Self {
        Self {
            label,
            records: Vec::new(),
            committed_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }
}
