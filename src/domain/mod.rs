//! Domain layer: scene tree, design objects and property values
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod objects;

pub use arena::{NodeId, SceneArena, SceneNode};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use objects::ObjectDefaults;
