use async_trait::async_trait;
use axum::Router;

/// Context handed to modules during initialization and startup
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Schema change contributed by a module
///
/// `up` may hold several statements; it runs as a single batch.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A unit of the service: routes, schema and lifecycle hooks
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name, also used as the mount segment of the module's routes
    fn name(&self) -> &'static str;

    /// API version segment, routes end up under `/api/{version}/{name}`
    fn api_version(&self) -> &'static str {
        "v1"
    }

    /// Called during startup, before migrations run
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Router for this module's endpoints, relative to its mount path
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` and `components.schemas`) for this module
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Migrations, executed in the order returned
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Called once migrations are complete
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Release resources during shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Mount path for a module's router.
pub fn mount_path(module: &dyn Module) -> String {
    format!("/api/{}/{}", module.api_version(), module.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Catalogue;

    #[async_trait]
    impl Module for Catalogue {
        fn name(&self) -> &'static str {
            "catalogue"
        }
    }

    #[test]
    fn mount_path_uses_version_and_name() {
        assert_eq!(mount_path(&Catalogue), "/api/v1/catalogue");
    }

    #[test]
    fn defaults_contribute_nothing() {
        assert!(Catalogue.openapi().is_none());
        assert!(Catalogue.migrations().is_empty());
    }
}
