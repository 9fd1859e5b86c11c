//! Wire shapes for the books endpoints

use biblioteca_http::{FieldError, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{Author, Book, BookData};
use crate::validation::FieldErrors;

const ISBN_MESSAGE: &str = "El ISBN debe tener entre 10 y 13 dígitos numéricos";

/// Create and update payload
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[schema(required = true, max_length = 255, example = "Sketch of the Analytical Engine")]
    pub titulo: Option<String>,
    #[schema(pattern = "^[0-9]{10,13}$", example = "9780000000001")]
    pub isbn: Option<String>,
    #[schema(max_length = 80)]
    pub genero: Option<String>,
    pub anio_publicacion: Option<i32>,
    #[schema(minimum = 1)]
    pub num_paginas: Option<i32>,
    #[schema(required = true)]
    pub autor_id: Option<i64>,
}

fn is_valid_isbn(isbn: &str) -> bool {
    (10..=13).contains(&isbn.len()) && isbn.bytes().all(|b| b.is_ascii_digit())
}

impl Validate for BookRequest {
    type Valid = BookData;

    fn validate(self) -> Result<BookData, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let titulo = errors.required_text("titulo", "El título", self.titulo, 255);

        if let Some(isbn) = &self.isbn {
            if !is_valid_isbn(isbn) {
                errors.push("isbn", ISBN_MESSAGE);
            }
        }

        let genero = errors.optional_text("genero", "El género", self.genero, 80);

        if matches!(self.num_paginas, Some(pages) if pages < 1) {
            errors.push("numPaginas", "La cantidad de páginas debe ser al menos 1");
        }
        if self.autor_id.is_none() {
            errors.push("autorId", "El ID del autor es obligatorio");
        }

        errors.finish(|| {
            Some(BookData {
                titulo: titulo?,
                isbn: self.isbn,
                genero,
                anio_publicacion: self.anio_publicacion,
                num_paginas: self.num_paginas,
                autor_id: self.autor_id?,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: i64,
    pub titulo: String,
    pub isbn: Option<String>,
    pub genero: Option<String>,
    pub anio_publicacion: Option<i32>,
    pub num_paginas: Option<i32>,
    pub activo: bool,
    pub autor_id: i64,
    /// Given and family name of the author, joined by a space
    pub autor_nombre_completo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookResponse {
    pub fn new(book: &Book, author_name: String) -> Self {
        Self {
            id: book.id(),
            titulo: book.titulo().to_string(),
            isbn: book.isbn().map(str::to_string),
            genero: book.genero().map(str::to_string),
            anio_publicacion: book.anio_publicacion(),
            num_paginas: book.num_paginas(),
            activo: book.is_active(),
            autor_id: book.autor_id(),
            autor_nombre_completo: author_name,
            created_at: book.created_at(),
            updated_at: book.updated_at(),
        }
    }

    pub fn with_author(book: &Book, author: &Author) -> Self {
        Self::new(book, author.full_name())
    }
}
