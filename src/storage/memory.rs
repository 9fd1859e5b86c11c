use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{AuthorStore, BookStore, StorageError, Visibility};
use crate::entities::{self, Author, AuthorData, Book, BookData};
use crate::pagination::{Direction, Page, PageRequest};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    last_author_id: i64,
    last_book_id: i64,
}

/// Lock-guarded tables with sequential ids starting at 1
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(
    mut rows: Vec<&T>,
    request: &PageRequest,
    compare: impl Fn(&T, &T, &'static str) -> Ordering,
    id: impl Fn(&T) -> i64,
) -> Page<T> {
    rows.sort_by(|a, b| {
        let ordering = match request.sort {
            Some(sort) => {
                let ordering = compare(*a, *b, sort.column);
                match sort.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            }
            None => Ordering::Equal,
        };
        ordering.then_with(|| id(*a).cmp(&id(*b)))
    });

    let total = rows.len() as u64;
    let content = rows
        .into_iter()
        .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
        .take(request.size as usize)
        .cloned()
        .collect();
    Page::new(content, request, total)
}

/// NULLs sort after every value, as PostgreSQL orders them ascending
fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn compare_authors(a: &Author, b: &Author, column: &str) -> Ordering {
    match column {
        "nombre" => a.nombre().cmp(b.nombre()),
        "apellido" => a.apellido().cmp(b.apellido()),
        "nacionalidad" => nulls_last(a.nacionalidad(), b.nacionalidad()),
        "fecha_nacimiento" => nulls_last(a.fecha_nacimiento(), b.fecha_nacimiento()),
        "created_at" => a.created_at().cmp(&b.created_at()),
        "updated_at" => a.updated_at().cmp(&b.updated_at()),
        _ => a.id().cmp(&b.id()),
    }
}

fn compare_books(a: &Book, b: &Book, column: &str) -> Ordering {
    match column {
        "titulo" => a.titulo().cmp(b.titulo()),
        "isbn" => nulls_last(a.isbn(), b.isbn()),
        "genero" => nulls_last(a.genero(), b.genero()),
        "anio_publicacion" => nulls_last(a.anio_publicacion(), b.anio_publicacion()),
        "num_paginas" => nulls_last(a.num_paginas(), b.num_paginas()),
        "created_at" => a.created_at().cmp(&b.created_at()),
        "updated_at" => a.updated_at().cmp(&b.updated_at()),
        _ => a.id().cmp(&b.id()),
    }
}

#[async_trait]
impl AuthorStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, StorageError> {
        Ok(self.tables.read().authors.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, StorageError> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.authors.get(id).cloned())
            .collect())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, StorageError> {
        Ok(self.tables.read().authors.contains_key(&id))
    }

    async fn exists_by_name(&self, nombre: &str, apellido: &str) -> Result<bool, StorageError> {
        Ok(self
            .tables
            .read()
            .authors
            .values()
            .any(|author| author.nombre() == nombre && author.apellido() == apellido))
    }

    async fn insert(&self, data: AuthorData) -> Result<Author, StorageError> {
        let mut tables = self.tables.write();
        tables.last_author_id += 1;
        let author = Author::create(tables.last_author_id, data, entities::now());
        tables.authors.insert(author.id(), author.clone());
        Ok(author)
    }

    async fn update(&self, author: &Author) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        match tables.authors.get_mut(&author.id()) {
            Some(row) => {
                *row = author.clone();
                Ok(())
            }
            None => Err(StorageError::Missing {
                entity: "Autor",
                id: author.id(),
            }),
        }
    }

    async fn find_page(
        &self,
        visibility: Visibility,
        request: &PageRequest,
    ) -> Result<Page<Author>, StorageError> {
        let tables = self.tables.read();
        let rows = tables
            .authors
            .values()
            .filter(|author| visibility.admits(author.is_active()))
            .collect();
        Ok(paginate(rows, request, compare_authors, Author::id))
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StorageError> {
        Ok(self.tables.read().books.get(&id).cloned())
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, StorageError> {
        Ok(self
            .tables
            .read()
            .books
            .values()
            .any(|book| book.isbn() == Some(isbn)))
    }

    async fn insert(&self, data: BookData) -> Result<Book, StorageError> {
        let mut tables = self.tables.write();
        tables.last_book_id += 1;
        let book = Book::create(tables.last_book_id, data, entities::now());
        tables.books.insert(book.id(), book.clone());
        Ok(book)
    }

    async fn update(&self, book: &Book) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        match tables.books.get_mut(&book.id()) {
            Some(row) => {
                *row = book.clone();
                Ok(())
            }
            None => Err(StorageError::Missing {
                entity: "Libro",
                id: book.id(),
            }),
        }
    }

    async fn find_page(
        &self,
        visibility: Visibility,
        request: &PageRequest,
    ) -> Result<Page<Book>, StorageError> {
        let tables = self.tables.read();
        let rows = tables
            .books
            .values()
            .filter(|book| visibility.admits(book.is_active()))
            .collect();
        Ok(paginate(rows, request, compare_books, Book::id))
    }

    async fn find_by_author(
        &self,
        author_id: i64,
        visibility: Visibility,
    ) -> Result<Vec<Book>, StorageError> {
        Ok(self
            .tables
            .read()
            .books
            .values()
            .filter(|book| book.autor_id() == author_id && visibility.admits(book.is_active()))
            .cloned()
            .collect())
    }
}
