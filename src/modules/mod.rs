pub mod autores;
pub mod libros;

use std::sync::Arc;

use biblioteca_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register the catalogue modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register_custom(Arc::new(autores::AutoresModule::new(state.clone())));
    registry.register_custom(Arc::new(libros::LibrosModule::new(state.clone())));
}
