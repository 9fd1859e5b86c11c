//! Router builder for the biblioteca HTTP server

use axum::{routing::get, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use biblioteca_kernel::{mount_path, Module, ModuleRegistry};

use crate::error::{attach_request_path, route_not_found};
use crate::MakeRequestUuidV7;

const API_TITLE: &str = "Biblioteca API";
const API_VERSION: &str = "1.0.0";

/// Builder for the main HTTP router.
///
/// Axum only wraps routes that already exist when a layer is added, so
/// routes and modules go in first and the `with_*` layers last.
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Nest a module's router under `/api/{version}/{name}`
    pub fn mount_module(mut self, module: &dyn Module) -> Self {
        self.router = self.router.nest(&mount_path(module), module.routes());
        self
    }

    /// Serve the merged OpenAPI document and Swagger UI
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let document = openapi_document(registry);

        let openapi: utoipa::openapi::OpenApi = serde_json::from_value(document.clone())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "merged OpenAPI document rejected, serving a bare one");
                utoipa::openapi::OpenApiBuilder::new()
                    .info(
                        utoipa::openapi::InfoBuilder::new()
                            .title(API_TITLE)
                            .version(API_VERSION)
                            .build(),
                    )
                    .build()
            });

        self.router = self
            .router
            .merge(utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .route(
                "/docs/openapi.json",
                get(move || async move { axum::Json(document.clone()) }),
            );
        self
    }

    /// Answer unmatched routes with the common error body
    pub fn with_fallback(mut self) -> Self {
        self.router = self.router.fallback(route_not_found);
        self
    }

    /// Fill `path` in error bodies
    pub fn with_error_paths(mut self) -> Self {
        self.router = self
            .router
            .layer(axum::middleware::from_fn(attach_request_path));
        self
    }

    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Tag requests with a UUIDv7 `x-request-id` and echo it on the response.
    /// Must be added after `with_tracing` so spans see the id.
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        self
    }

    /// Answer slow requests with 408. Add before `with_error_paths` so the
    /// timeout response gets the common body.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms)));
        self
    }

    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// OpenAPI document merged from every module's fragment.
///
/// Module paths are relative to the module; they are prefixed with its mount
/// path here, `/` mapping to the mount path itself.
pub fn openapi_document(registry: &ModuleRegistry) -> Value {
    let mut document = json!({
        "openapi": "3.1.0",
        "info": {
            "title": API_TITLE,
            "version": API_VERSION,
            "description": "Catálogo de autores y libros"
        },
        "paths": {
            "/healthz": {
                "get": {
                    "summary": "Health check",
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "timestamp": { "type": "string", "format": "date-time" },
                        "status": { "type": "integer" },
                        "error": { "type": "string" },
                        "message": { "type": "string" },
                        "path": { "type": "string" }
                    },
                    "required": ["timestamp", "status", "error", "message", "path"]
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(fragment) = module.openapi() else {
            continue;
        };
        let prefix = mount_path(module.as_ref());

        if let Some(paths) = fragment.get("paths").and_then(Value::as_object) {
            for (path, item) in paths {
                let full_path = if path == "/" {
                    prefix.clone()
                } else {
                    format!("{}{}", prefix, path)
                };
                document["paths"][full_path] = item.clone();
            }
        }

        if let Some(schemas) = fragment
            .pointer("/components/schemas")
            .and_then(Value::as_object)
        {
            for (name, schema) in schemas {
                document["components"]["schemas"][name] = schema.clone();
            }
        }
    }

    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Shelves;

    #[async_trait]
    impl Module for Shelves {
        fn name(&self) -> &'static str {
            "estantes"
        }

        fn routes(&self) -> Router {
            Router::new()
                .route("/", get(|| async { "all shelves" }))
                .route("/{id}", get(|| async { "one shelf" }))
        }

        fn openapi(&self) -> Option<Value> {
            Some(json!({
                "paths": {
                    "/": { "get": { "summary": "List shelves", "responses": {} } },
                    "/{id}": { "get": { "summary": "Get shelf", "responses": {} } }
                },
                "components": { "schemas": { "Shelf": { "type": "object" } } }
            }))
        }
    }

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(Shelves));
        registry
    }

    async fn get_status(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[test]
    fn test_openapi_paths_are_prefixed() {
        let document = openapi_document(&registry());
        let paths = document["paths"].as_object().unwrap();

        assert!(paths.contains_key("/healthz"));
        assert!(paths.contains_key("/api/v1/estantes"));
        assert!(paths.contains_key("/api/v1/estantes/{id}"));
        assert!(!paths.contains_key("/api/v1/estantes/"));
        assert!(document["components"]["schemas"]["Shelf"].is_object());
        assert!(document["components"]["schemas"]["ErrorResponse"].is_object());
    }

    #[tokio::test]
    async fn test_module_mounting() {
        let registry = registry();
        let mut builder = RouterBuilder::new();
        for module in registry.modules() {
            builder = builder.mount_module(module.as_ref());
        }
        let router = builder.with_fallback().with_error_paths().build();

        let (status, body) = get_status(router.clone(), "/api/v1/estantes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"all shelves");

        let (status, body) = get_status(router, "/api/v1/estantes/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"one shelf");
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_body() {
        let router = RouterBuilder::new()
            .route("/healthz", get(|| async { "ok" }))
            .with_fallback()
            .with_error_paths()
            .build();

        let (status, body) = get_status(router, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["path"], "/nowhere");
        assert_eq!(value["error"], "No encontrado");
    }

    #[tokio::test]
    async fn test_timeout_uses_error_body() {
        let router = RouterBuilder::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
            .with_timeout(20)
            .with_error_paths()
            .build();

        let (status, body) = get_status(router, "/slow").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], 408);
        assert_eq!(value["error"], "Tiempo de espera agotado");
        assert_eq!(value["path"], "/slow");
    }

    #[tokio::test]
    async fn test_middleware_chain_echoes_request_id() {
        let router = RouterBuilder::new()
            .route("/healthz", get(|| async { "ok" }))
            .with_cors()
            .with_timeout(5000)
            .with_tracing()
            .with_request_id()
            .build();

        let response = router
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
