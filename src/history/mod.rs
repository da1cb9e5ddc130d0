//! Change tracking and undo/redo
//!
//! - `interceptor`: wrapping and the recording mutation API
//! - `transaction`: batches, undo/redo stacks and replay
//! - `notifier`: rebuild of affected objects after replay

pub mod change;
pub mod error;
pub mod interceptor;
pub mod notifier;
pub mod transaction;

pub use change::{Batch, ChangeRecord};
pub use error::{HistoryError, HistoryResult};
pub use interceptor::{Interceptor, Tracked, WrapOutcome};
pub use notifier::{NoopRebuildHook, RebuildHook, RebuildNotifier};
pub use transaction::{ReplayReport, TransactionManager};
