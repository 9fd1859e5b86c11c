//! Persistence for authors and books.
//!
//! Services only see the [`AuthorStore`] and [`BookStore`] traits. Two
//! backends implement them: an in-memory one and PostgreSQL.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use biblioteca_kernel::{settings::DatabaseSettings, settings::StorageBackend, Module};
use sqlx::PgPool;
use thiserror::Error;

use crate::entities::{Author, AuthorData, Book, BookData};
use crate::pagination::{Page, PageRequest};

/// Which rows a listing may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    ActiveOnly,
    IncludeInactive,
}

impl Visibility {
    pub fn admits(self, active: bool) -> bool {
        match self {
            Visibility::ActiveOnly => active,
            Visibility::IncludeInactive => true,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} vanished from the store")]
    Missing { entity: &'static str, id: i64 },
}

#[async_trait]
pub trait AuthorStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, StorageError>;

    /// Authors with any of the given ids, in no particular order
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, StorageError>;

    async fn exists_by_id(&self, id: i64) -> Result<bool, StorageError>;

    /// Exact match on the name pair, active or not
    async fn exists_by_name(&self, nombre: &str, apellido: &str) -> Result<bool, StorageError>;

    async fn insert(&self, data: AuthorData) -> Result<Author, StorageError>;

    /// Persist every field of an existing author
    async fn update(&self, author: &Author) -> Result<(), StorageError>;

    async fn find_page(
        &self,
        visibility: Visibility,
        request: &PageRequest,
    ) -> Result<Page<Author>, StorageError>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StorageError>;

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, StorageError>;

    async fn insert(&self, data: BookData) -> Result<Book, StorageError>;

    async fn update(&self, book: &Book) -> Result<(), StorageError>;

    async fn find_page(
        &self,
        visibility: Visibility,
        request: &PageRequest,
    ) -> Result<Page<Book>, StorageError>;

    /// Every book referencing the author, ordered by id
    async fn find_by_author(
        &self,
        author_id: i64,
        visibility: Visibility,
    ) -> Result<Vec<Book>, StorageError>;
}

/// Store handles shared by the services
#[derive(Clone)]
pub struct Storage {
    pub authors: Arc<dyn AuthorStore>,
    pub books: Arc<dyn BookStore>,
    pool: Option<PgPool>,
}

impl Storage {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            authors: store.clone(),
            books: store,
            pool: None,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            authors: store.clone(),
            books: store,
            pool: Some(pool),
        }
    }

    /// Build the configured backend, connecting to PostgreSQL when selected
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        match settings.backend {
            StorageBackend::Memory => {
                tracing::info!(target: "biblioteca-db", "using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::Postgres => {
                let pool = biblioteca_db::connect(settings).await?;
                Ok(Self::postgres(pool))
            }
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }
}

/// Core module owning the storage backend's lifetime
pub struct StorageModule {
    storage: Storage,
}

impl StorageModule {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Module for StorageModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn start(&self, _ctx: &biblioteca_kernel::InitCtx<'_>) -> anyhow::Result<()> {
        let backend = if self.storage.pool().is_some() {
            "postgres"
        } else {
            "memory"
        };
        tracing::info!(module = self.name(), backend, "storage ready");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        if let Some(pool) = self.storage.pool() {
            pool.close().await;
            tracing::info!(module = self.name(), "database pool closed");
        }
        Ok(())
    }
}
