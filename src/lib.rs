//! Biblioteca application library
//!
//! Authors and books catalogue served through the biblioteca module kernel.

pub mod entities;
pub mod error;
pub mod modules;
pub mod pagination;
pub mod state;
pub mod storage;
pub mod validation;

pub use error::ServiceError;
pub use state::AppState;
pub use storage::Storage;

use std::sync::Arc;

use anyhow::Context;
use biblioteca_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use storage::StorageModule;

/// Registry with the storage core module and the catalogue modules
pub fn build_registry(storage: &Storage, settings: &Settings) -> ModuleRegistry {
    let state = AppState::new(storage, settings.pagination.clone());

    let mut registry = ModuleRegistry::new();
    registry.register_core(Arc::new(StorageModule::new(storage.clone())));
    modules::register_all(&mut registry, &state);
    registry
}

/// Apply pending module migrations. The in-memory backend has none to run.
pub async fn migrate(registry: &ModuleRegistry, storage: &Storage) -> anyhow::Result<usize> {
    let Some(pool) = storage.pool() else {
        tracing::info!("in-memory storage selected, nothing to migrate");
        return Ok(0);
    };

    let migrations = registry.collect_migrations();
    let applied = biblioteca_db::migrate(pool, &migrations)
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

/// Run the service until shutdown: init, migrate, start, serve, stop.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "biblioteca bootstrap starting"
    );

    let storage = Storage::connect(&settings.database)
        .await
        .context("failed to open storage")?;
    let registry = build_registry(&storage, &settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;
    migrate(&registry, &storage).await?;
    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    tracing::info!(
        core = registry.core_module_count(),
        custom = registry.custom_module_count(),
        "biblioteca bootstrap complete"
    );

    let served = biblioteca_http::start_server(&registry, &settings).await;

    registry.stop_custom_modules().await?;
    registry.stop_core_modules().await?;
    served
}
