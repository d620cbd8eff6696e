//! Editor-side tooling that works on a [`Scene`](crate::scene::Scene).
//!
//! Submodules overview:
//! - [`commands`] – queue of hierarchy edits applied after a scene walk
//! - [`inspector`] – outliner rows, selection and edit requests

pub mod commands;
pub mod inspector;

pub use commands::{HierarchyCmd, HierarchyCommands};
pub use inspector::{Inspector, OutlineRow};
