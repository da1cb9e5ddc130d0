//! Commands: named, undoable editing operations
//!
//! Commands are looked up by name in a [`CommandRegistry`] and run by the
//! dispatcher inside a transaction bracket.

pub mod args;
pub mod builtin;
pub mod dispatcher;
pub mod error;
pub mod registry;

use serde_json::Value as JsonValue;

pub use args::CommandArgs;
pub use dispatcher::{CommandContext, Session, Workspace};
pub use error::{CommandError, CommandResult};
pub use registry::{CommandFactory, CommandRegistry};

pub trait Command: Send {
    fn name(&self) -> &'static str;

    /// Whether dispatch brackets this command in a batch by default.
    fn should_record_undo(&self) -> bool {
        true
    }

    /// Reserved; the dispatcher only logs it.
    fn should_cancel_previous_command(&self) -> bool {
        false
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>, args: &CommandArgs) -> CommandResult<JsonValue>;
}
