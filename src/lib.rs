//! planscene: command dispatch and transactional undo/redo over a scene tree
//!
//! Layers, innermost first:
//! - `domain`: scene arena, node kinds, property values, object constructors
//! - `history`: mutation interceptor, transaction manager, rebuild notifier
//! - `commands`: command registry, dispatcher, built-in commands
//! - `application`: scripted sessions
//! - `infrastructure`: I/O implementations and service wiring
//! - `cli`: argument parsing and output

pub mod application;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod history;
pub mod infrastructure;
pub mod util;
