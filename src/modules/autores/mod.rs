//! Authors: CRUD with soft delete plus the books of each author.

mod handlers;
pub mod models;
mod service;

pub use models::{AuthorRequest, AuthorResponse};
pub use service::AuthorService;

use async_trait::async_trait;
use axum::{routing::get, Router};
use biblioteca_kernel::{InitCtx, Migration, Module};
use serde_json::json;
use utoipa::PartialSchema;

use crate::pagination::{page_parameters, page_schema};
use crate::state::AppState;

pub struct AutoresModule {
    state: AppState,
}

impl AutoresModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AutoresModule {
    fn name(&self) -> &'static str {
        "autores"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "autores module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list).post(handlers::create))
            .route(
                "/{id}",
                get(handlers::get_by_id)
                    .put(handlers::update)
                    .delete(handlers::deactivate),
            )
            .route("/{id}/libros", get(handlers::list_books))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let id_parameter = json!([{
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);
        let error = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
            })
        };
        let author = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthorResponse" } } }
            })
        };
        let body = json!({
            "required": true,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthorRequest" } } }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List active authors",
                        "tags": ["Autores"],
                        "parameters": page_parameters(),
                        "responses": {
                            "200": {
                                "description": "Page of authors",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AuthorPage" } } }
                            },
                            "400": error("Invalid page request")
                        }
                    },
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Autores"],
                        "requestBody": body.clone(),
                        "responses": {
                            "201": author("Author created"),
                            "400": error("Invalid payload"),
                            "409": error("Name pair already registered")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get an author by id",
                        "tags": ["Autores"],
                        "parameters": id_parameter.clone(),
                        "responses": {
                            "200": author("Author"),
                            "404": error("Unknown author")
                        }
                    },
                    "put": {
                        "summary": "Update an author",
                        "tags": ["Autores"],
                        "parameters": id_parameter.clone(),
                        "requestBody": body,
                        "responses": {
                            "200": author("Author updated"),
                            "400": error("Invalid payload"),
                            "404": error("Unknown author")
                        }
                    },
                    "delete": {
                        "summary": "Deactivate an author",
                        "tags": ["Autores"],
                        "parameters": id_parameter.clone(),
                        "responses": {
                            "204": { "description": "Author deactivated" },
                            "404": error("Unknown author")
                        }
                    }
                },
                "/{id}/libros": {
                    "get": {
                        "summary": "List the active books of an author",
                        "tags": ["Autores"],
                        "parameters": id_parameter,
                        "responses": {
                            "200": {
                                "description": "Books of the author",
                                "content": { "application/json": { "schema": {
                                    "type": "array",
                                    "items": { "$ref": "#/components/schemas/BookResponse" }
                                } } }
                            },
                            "404": error("Unknown author")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "AuthorRequest": serde_json::to_value(AuthorRequest::schema()).unwrap_or_default(),
                    "AuthorResponse": serde_json::to_value(AuthorResponse::schema()).unwrap_or_default(),
                    "AuthorPage": page_schema("AuthorResponse")
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_autores",
            up: r#"
                CREATE TABLE IF NOT EXISTS autores (
                    id               BIGSERIAL    PRIMARY KEY,
                    nombre           VARCHAR(100) NOT NULL,
                    apellido         VARCHAR(100) NOT NULL,
                    nacionalidad     VARCHAR(80),
                    fecha_nacimiento DATE,
                    activo           BOOLEAN      NOT NULL DEFAULT TRUE,
                    created_at       TIMESTAMPTZ  NOT NULL DEFAULT now(),
                    updated_at       TIMESTAMPTZ  NOT NULL DEFAULT now()
                );
                CREATE INDEX IF NOT EXISTS autores_nombre_apellido_idx ON autores (nombre, apellido);
                CREATE INDEX IF NOT EXISTS autores_activo_idx ON autores (activo);
            "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "autores module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "autores module stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use biblioteca_kernel::settings::PaginationSettings;

    fn module() -> AutoresModule {
        AutoresModule::new(AppState::new(
            &Storage::in_memory(),
            PaginationSettings::default(),
        ))
    }

    #[test]
    fn openapi_documents_every_route() {
        let fragment = module().openapi().unwrap();
        let paths = fragment["paths"].as_object().unwrap();

        assert!(paths.contains_key("/"));
        assert!(paths.contains_key("/{id}"));
        assert!(paths.contains_key("/{id}/libros"));
        assert!(fragment["components"]["schemas"]["AuthorResponse"].is_object());
        assert!(fragment["components"]["schemas"]["AuthorRequest"].is_object());
    }

    #[test]
    fn migration_creates_the_table() {
        let migrations = module().migrations();

        assert_eq!(migrations.len(), 1);
        assert!(migrations[0].up.contains("CREATE TABLE IF NOT EXISTS autores"));
    }
}
