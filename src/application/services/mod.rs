//! Application services
//!
//! Concrete service implementations that orchestrate command sessions.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod script;

pub use script::{Script, ScriptReport, ScriptService, ScriptStep, StepOutcome};
