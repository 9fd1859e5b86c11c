//! Catalogue behaviour against PostgreSQL.
//!
//! Needs a scratch database in `DATABASE_URL`; each test migrates its own
//! schema and drops it afterwards. Run with
//! `cargo test --test postgres -- --ignored`.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};

use axum::{http::Method, http::StatusCode, Router};
use biblioteca_app::{build_registry, migrate, Storage};
use biblioteca_kernel::settings::Settings;
use serde_json::{json, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use common::send;

static SCHEMAS: AtomicU32 = AtomicU32::new(0);

struct Catalogue {
    app: Router,
    admin: PgPool,
    schema: String,
}

impl Catalogue {
    async fn start() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must name a scratch database");
        let admin = PgPool::connect(&url).await.unwrap();

        let schema = format!(
            "biblioteca_test_{}_{}",
            std::process::id(),
            SCHEMAS.fetch_add(1, Ordering::SeqCst)
        );
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
            .execute(&admin)
            .await
            .unwrap();
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await
            .unwrap();

        let options: PgConnectOptions = url.parse().unwrap();
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_with(options.options([("search_path", schema.as_str())]))
            .await
            .unwrap();

        let settings = Settings::default();
        let storage = Storage::postgres(pool);
        let registry = build_registry(&storage, &settings);
        let applied = migrate(&registry, &storage).await.unwrap();
        assert_eq!(applied, 2);

        Self {
            app: biblioteca_http::build_router(&registry, &settings),
            admin,
            schema,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(&self.app, method, uri, body).await
    }

    async fn finish(self) {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .unwrap();
    }
}

fn names(page: &Value) -> Vec<String> {
    page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|author| author["nombre"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn update_response_matches_stored_row() {
    let db = Catalogue::start().await;

    let (status, ada) = db
        .send(
            Method::POST,
            "/api/v1/autores",
            Some(json!({ "nombre": "Ada", "apellido": "Lovelace" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ada["id"], 1);

    let (status, updated) = db
        .send(
            Method::PUT,
            "/api/v1/autores/1",
            Some(json!({ "nombre": "Ada", "apellido": "King", "fechaNacimiento": "1815-12-10" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["createdAt"], ada["createdAt"]);

    let (_, fetched) = db.send(Method::GET, "/api/v1/autores/1", None).await;
    assert_eq!(fetched, updated);

    db.finish().await;
}

#[tokio::test]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn books_follow_catalogue_rules() {
    let db = Catalogue::start().await;
    db.send(
        Method::POST,
        "/api/v1/autores",
        Some(json!({ "nombre": "Ada", "apellido": "Lovelace" })),
    )
    .await;

    let (status, book) = db
        .send(
            Method::POST,
            "/api/v1/libros",
            Some(json!({ "titulo": "Notes", "isbn": "1234567890", "autorId": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["autorNombreCompleto"], "Ada Lovelace");

    let (status, body) = db
        .send(
            Method::POST,
            "/api/v1/libros",
            Some(json!({ "titulo": "Copy", "isbn": "1234567890", "autorId": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Ya existe un Libro (ISBN) con el valor '1234567890'"
    );

    let (status, _) = db
        .send(
            Method::POST,
            "/api/v1/libros",
            Some(json!({ "titulo": "Orphan", "autorId": 9 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = db.send(Method::DELETE, "/api/v1/autores/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, books) = db.send(Method::GET, "/api/v1/autores/1/libros", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books.as_array().unwrap().len(), 1);

    let (status, _) = db.send(Method::DELETE, "/api/v1/libros/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, page) = db.send(Method::GET, "/api/v1/libros", None).await;
    assert_eq!(page["totalElements"], 0);
    let (_, stored) = db.send(Method::GET, "/api/v1/libros/1", None).await;
    assert_eq!(stored["activo"], false);

    db.finish().await;
}

#[tokio::test]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn pages_sort_like_the_memory_backend() {
    let db = Catalogue::start().await;
    for author in [
        json!({ "nombre": "Ada", "apellido": "Lovelace" }),
        json!({ "nombre": "Alan", "apellido": "Turing", "nacionalidad": "Británica" }),
        json!({ "nombre": "Grace", "apellido": "Hopper", "nacionalidad": "Estadounidense" }),
    ] {
        let (status, _) = db.send(Method::POST, "/api/v1/autores", Some(author)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, page) = db
        .send(Method::GET, "/api/v1/autores?sort=nacionalidad,asc", None)
        .await;
    assert_eq!(names(&page), vec!["Alan", "Grace", "Ada"]);

    let (_, page) = db
        .send(Method::GET, "/api/v1/autores?sort=nacionalidad,desc", None)
        .await;
    assert_eq!(names(&page), vec!["Ada", "Grace", "Alan"]);

    let (_, page) = db
        .send(Method::GET, "/api/v1/autores?page=1&size=2&sort=nombre", None)
        .await;
    assert_eq!(names(&page), vec!["Grace"]);
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["last"], true);

    db.finish().await;
}
