use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{AuthorStore, BookStore, StorageError, Visibility};
use crate::entities::{Author, AuthorData, Book, BookData};
use crate::pagination::{Page, PageRequest};

const AUTHOR_COLUMNS: &str =
    "id, nombre, apellido, nacionalidad, fecha_nacimiento, activo, created_at, updated_at";
const BOOK_COLUMNS: &str = "id, titulo, isbn, genero, anio_publicacion, num_paginas, activo, \
                            autor_id, created_at, updated_at";

/// Tables `autores` and `libros`, created by the module migrations
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read-only transaction whose statements share one snapshot, so a page's
    /// count and rows agree
    async fn snapshot(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

fn visibility_clause(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::ActiveOnly => "WHERE activo = TRUE",
        Visibility::IncludeInactive => "",
    }
}

/// `ORDER BY` for a page. The column comes from a compile-time whitelist.
fn order_clause(request: &PageRequest) -> String {
    match request.sort {
        Some(sort) if sort.column != "id" => {
            format!("ORDER BY {} {}, id ASC", sort.column, sort.direction.as_sql())
        }
        Some(sort) => format!("ORDER BY id {}", sort.direction.as_sql()),
        None => "ORDER BY id ASC".to_string(),
    }
}

fn limit_offset(request: &PageRequest) -> (i64, i64) {
    (
        i64::from(request.size),
        i64::try_from(request.offset()).unwrap_or(i64::MAX),
    )
}

#[async_trait]
impl AuthorStore for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, StorageError> {
        let sql = format!("SELECT {} FROM autores WHERE id = $1", AUTHOR_COLUMNS);
        let author = sqlx::query_as::<_, Author>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM autores WHERE id = ANY($1)", AUTHOR_COLUMNS);
        let authors = sqlx::query_as::<_, Author>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(authors)
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, StorageError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM autores WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn exists_by_name(&self, nombre: &str, apellido: &str) -> Result<bool, StorageError> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM autores WHERE nombre = $1 AND apellido = $2)",
        )
        .bind(nombre)
        .bind(apellido)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, data: AuthorData) -> Result<Author, StorageError> {
        let sql = format!(
            "INSERT INTO autores (nombre, apellido, nacionalidad, fecha_nacimiento) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            AUTHOR_COLUMNS
        );
        let author = sqlx::query_as::<_, Author>(&sql)
            .bind(data.nombre)
            .bind(data.apellido)
            .bind(data.nacionalidad)
            .bind(data.fecha_nacimiento)
            .fetch_one(&self.pool)
            .await?;
        Ok(author)
    }

    async fn update(&self, author: &Author) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE autores SET nombre = $2, apellido = $3, nacionalidad = $4, \
             fecha_nacimiento = $5, activo = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(author.id())
        .bind(author.nombre())
        .bind(author.apellido())
        .bind(author.nacionalidad())
        .bind(author.fecha_nacimiento())
        .bind(author.is_active())
        .bind(author.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Missing {
                entity: "Autor",
                id: author.id(),
            });
        }
        Ok(())
    }

    async fn find_page(
        &self,
        visibility: Visibility,
        request: &PageRequest,
    ) -> Result<Page<Author>, StorageError> {
        let filter = visibility_clause(visibility);
        let mut tx = self.snapshot().await?;
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM autores {}", filter))
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT {} FROM autores {} {} LIMIT $1 OFFSET $2",
            AUTHOR_COLUMNS,
            filter,
            order_clause(request)
        );
        let (limit, offset) = limit_offset(request);
        let content = sqlx::query_as::<_, Author>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Page::new(content, request, total.max(0) as u64))
    }
}

#[async_trait]
impl BookStore for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StorageError> {
        let sql = format!("SELECT {} FROM libros WHERE id = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, StorageError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM libros WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert(&self, data: BookData) -> Result<Book, StorageError> {
        let sql = format!(
            "INSERT INTO libros (titulo, isbn, genero, anio_publicacion, num_paginas, autor_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(data.titulo)
            .bind(data.isbn)
            .bind(data.genero)
            .bind(data.anio_publicacion)
            .bind(data.num_paginas)
            .bind(data.autor_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(book)
    }

    async fn update(&self, book: &Book) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE libros SET titulo = $2, isbn = $3, genero = $4, anio_publicacion = $5, \
             num_paginas = $6, activo = $7, autor_id = $8, updated_at = $9 WHERE id = $1",
        )
        .bind(book.id())
        .bind(book.titulo())
        .bind(book.isbn())
        .bind(book.genero())
        .bind(book.anio_publicacion())
        .bind(book.num_paginas())
        .bind(book.is_active())
        .bind(book.autor_id())
        .bind(book.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Missing {
                entity: "Libro",
                id: book.id(),
            });
        }
        Ok(())
    }

    async fn find_page(
        &self,
        visibility: Visibility,
        request: &PageRequest,
    ) -> Result<Page<Book>, StorageError> {
        let filter = visibility_clause(visibility);
        let mut tx = self.snapshot().await?;
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM libros {}", filter))
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT {} FROM libros {} {} LIMIT $1 OFFSET $2",
            BOOK_COLUMNS,
            filter,
            order_clause(request)
        );
        let (limit, offset) = limit_offset(request);
        let content = sqlx::query_as::<_, Book>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Page::new(content, request, total.max(0) as u64))
    }

    async fn find_by_author(
        &self,
        author_id: i64,
        visibility: Visibility,
    ) -> Result<Vec<Book>, StorageError> {
        let active_only = matches!(visibility, Visibility::ActiveOnly);
        let sql = format!(
            "SELECT {} FROM libros WHERE autor_id = $1 AND (activo OR NOT $2) ORDER BY id ASC",
            BOOK_COLUMNS
        );
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(author_id)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }
}
