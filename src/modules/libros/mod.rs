//! Books: CRUD with soft delete. Every book references one author.

mod handlers;
pub mod models;
mod service;

pub use models::{BookRequest, BookResponse};
pub use service::BookService;

use async_trait::async_trait;
use axum::{routing::get, Router};
use biblioteca_kernel::{InitCtx, Migration, Module};
use serde_json::json;
use utoipa::PartialSchema;

use crate::pagination::{page_parameters, page_schema};
use crate::state::AppState;

pub struct LibrosModule {
    state: AppState,
}

impl LibrosModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for LibrosModule {
    fn name(&self) -> &'static str {
        "libros"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "libros module initialized"
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
        let book = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookResponse" } } }
            })
        };
        let body = json!({
            "required": true,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookRequest" } } }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List active books",
                        "tags": ["Libros"],
                        "parameters": page_parameters(),
                        "responses": {
                            "200": {
                                "description": "Page of books",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookPage" } } }
                            },
                            "400": error("Invalid page request")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Libros"],
                        "requestBody": body.clone(),
                        "responses": {
                            "201": book("Book created"),
                            "400": error("Invalid payload"),
                            "404": error("Unknown author"),
                            "409": error("ISBN already registered")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book by id",
                        "tags": ["Libros"],
                        "parameters": id_parameter.clone(),
                        "responses": {
                            "200": book("Book"),
                            "404": error("Unknown book")
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Libros"],
                        "parameters": id_parameter.clone(),
                        "requestBody": body,
                        "responses": {
                            "200": book("Book updated"),
                            "400": error("Invalid payload"),
                            "404": error("Unknown book or author")
                        }
                    },
                    "delete": {
                        "summary": "Deactivate a book",
                        "tags": ["Libros"],
                        "parameters": id_parameter,
                        "responses": {
                            "204": { "description": "Book deactivated" },
                            "404": error("Unknown book")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookRequest": serde_json::to_value(BookRequest::schema()).unwrap_or_default(),
                    "BookResponse": serde_json::to_value(BookResponse::schema()).unwrap_or_default(),
                    "BookPage": page_schema("BookResponse")
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_libros",
            up: r#"
                CREATE TABLE IF NOT EXISTS libros (
                    id               BIGSERIAL    PRIMARY KEY,
                    titulo           VARCHAR(255) NOT NULL,
                    isbn             VARCHAR(13),
                    genero           VARCHAR(80),
                    anio_publicacion INTEGER,
                    num_paginas      INTEGER,
                    activo           BOOLEAN      NOT NULL DEFAULT TRUE,
                    autor_id         BIGINT       NOT NULL REFERENCES autores (id),
                    created_at       TIMESTAMPTZ  NOT NULL DEFAULT now(),
                    updated_at       TIMESTAMPTZ  NOT NULL DEFAULT now()
                );
                CREATE INDEX IF NOT EXISTS libros_isbn_idx ON libros (isbn);
                CREATE INDEX IF NOT EXISTS libros_autor_id_idx ON libros (autor_id);
                CREATE INDEX IF NOT EXISTS libros_activo_idx ON libros (activo);
            "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "libros module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "libros module stopped");
        Ok(())
    }
}
