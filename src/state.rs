use biblioteca_kernel::settings::PaginationSettings;

use crate::modules::{autores::AuthorService, libros::BookService};
use crate::storage::Storage;

/// Shared handler state for the catalogue modules
#[derive(Clone)]
pub struct AppState {
    pub authors: AuthorService,
    pub books: BookService,
    pub pagination: PaginationSettings,
}

impl AppState {
    pub fn new(storage: &Storage, pagination: PaginationSettings) -> Self {
        Self {
            authors: AuthorService::new(storage.authors.clone()),
            books: BookService::new(storage.books.clone(), storage.authors.clone()),
            pagination,
        }
    }
}
