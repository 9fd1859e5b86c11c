use std::collections::HashMap;
use std::sync::Arc;


use super::models::BookResponse;
use crate::entities::{self, Author, Book, BookData};
use crate::error::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::storage::{AuthorStore, BookStore, StorageError, Visibility};

const RESOURCE: &str = "Libro";
const AUTHOR_RESOURCE: &str = "Autor";
const ISBN_RESOURCE: &str = "Libro (ISBN)";

/// Book business rules. Reads authors to check references and to fill in
/// the author's display name.
#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BookStore>,
    authors: Arc<dyn AuthorStore>,
}

impl BookService {
    pub fn new(books: Arc<dyn BookStore>, authors: Arc<dyn AuthorStore>) -> Self {
        Self { books, authors }
    }

    /// Register a new active book. The author must exist; a supplied ISBN
    /// must be unused by every book.
    pub async fn create(&self, data: BookData) -> Result<BookResponse, ServiceError> {
        let author = self.find_author(data.autor_id).await?;

        if let Some(isbn) = data.isbn.as_deref() {
            if self.books.exists_by_isbn(isbn).await? {
                return Err(ServiceError::duplicate(ISBN_RESOURCE, isbn));
            }
        }

        let book = self.books.insert(data).await?;
        tracing::info!(book_id = book.id(), author_id = author.id(), "book created");
        Ok(BookResponse::with_author(&book, &author))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<BookResponse, ServiceError> {
        let book = self.find(id).await?;
        let author = self
            .authors
            .find_by_id(book.autor_id())
            .await?
            .ok_or(StorageError::Missing {
                entity: AUTHOR_RESOURCE,
                id: book.autor_id(),
            })?;
        Ok(BookResponse::with_author(&book, &author))
    }

    pub async fn list(&self, request: &PageRequest) -> Result<Page<BookResponse>, ServiceError> {
        let page = self.books.find_page(Visibility::ActiveOnly, request).await?;
        let names = self.author_names(&page.content).await?;
        page.try_map(|book| respond(&book, &names))
    }

    /// Overwrite the editable fields, possibly moving the book to another
    /// author. The ISBN is not checked again.
    pub async fn update(&self, id: i64, data: BookData) -> Result<BookResponse, ServiceError> {
        let mut book = self.find(id).await?;
        let author = self.find_author(data.autor_id).await?;

        book.update_fields(data, entities::now());
        self.books.update(&book).await?;

        tracing::info!(book_id = id, author_id = author.id(), "book updated");
        Ok(BookResponse::with_author(&book, &author))
    }

    pub async fn deactivate(&self, id: i64) -> Result<(), ServiceError> {
        let mut book = self.find(id).await?;
        if !book.is_active() {
            tracing::debug!(book_id = id, "book already inactive");
            return Ok(());
        }

        book.deactivate(entities::now());
        self.books.update(&book).await?;
        tracing::info!(book_id = id, "book deactivated");
        Ok(())
    }

    /// Every active book of an author, whether or not the author is active
    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<BookResponse>, ServiceError> {
        if !self.authors.exists_by_id(author_id).await? {
            return Err(ServiceError::not_found(AUTHOR_RESOURCE, author_id));
        }

        let books = self
            .books
            .find_by_author(author_id, Visibility::ActiveOnly)
            .await?;
        let names = self.author_names(&books).await?;
        books.iter().map(|book| respond(book, &names)).collect()
    }

    async fn find(&self, id: i64) -> Result<Book, ServiceError> {
        self.books
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(RESOURCE, id))
    }

    async fn find_author(&self, id: i64) -> Result<Author, ServiceError> {
        self.authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(AUTHOR_RESOURCE, id))
    }

    /// Display names of the authors of `books`, loaded in one lookup
    async fn author_names(&self, books: &[Book]) -> Result<HashMap<i64, String>, ServiceError> {
        let mut ids: Vec<i64> = books.iter().map(Book::autor_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let authors = self.authors.find_by_ids(&ids).await?;
        Ok(authors
            .iter()
            .map(|author| (author.id(), author.full_name()))
            .collect())
    }
}

fn respond(book: &Book, names: &HashMap<i64, String>) -> Result<BookResponse, ServiceError> {
    let name = names.get(&book.autor_id()).ok_or(StorageError::Missing {
        entity: AUTHOR_RESOURCE,
        id: book.autor_id(),
    })?;
    Ok(BookResponse::new(book, name.clone()))
}
