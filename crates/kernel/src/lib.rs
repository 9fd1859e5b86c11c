//! Core traits, settings and module registry shared by every biblioteca crate.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{mount_path, InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
