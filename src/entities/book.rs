use chrono::{DateTime, Utc};

/// Book fields a client may set. `autor_id` must point at an existing author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookData {
    pub titulo: String,
    pub isbn: Option<String>,
    pub genero: Option<String>,
    pub anio_publicacion: Option<i32>,
    pub num_paginas: Option<i32>,
    pub autor_id: i64,
}

/// Persisted book row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Book {
    id: i64,
    titulo: String,
    isbn: Option<String>,
    genero: Option<String>,
    anio_publicacion: Option<i32>,
    num_paginas: Option<i32>,
    activo: bool,
    autor_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    pub fn create(id: i64, data: BookData, now: DateTime<Utc>) -> Self {
        Self {
            id,
            titulo: data.titulo,
            isbn: data.isbn,
            genero: data.genero,
            anio_publicacion: data.anio_publicacion,
            num_paginas: data.num_paginas,
            activo: true,
            autor_id: data.autor_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn titulo(&self) -> &str {
        &self.titulo
    }

    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref()
    }

    pub fn genero(&self) -> Option<&str> {
        self.genero.as_deref()
    }

    pub fn anio_publicacion(&self) -> Option<i32> {
        self.anio_publicacion
    }

    pub fn num_paginas(&self) -> Option<i32> {
        self.num_paginas
    }

    pub fn is_active(&self) -> bool {
        self.activo
    }

    pub fn autor_id(&self) -> i64 {
        self.autor_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Overwrite the editable fields, author reference included
    pub fn update_fields(&mut self, data: BookData, now: DateTime<Utc>) {
        self.titulo = data.titulo;
        self.isbn = data.isbn;
        self.genero = data.genero;
        self.anio_publicacion = data.anio_publicacion;
        self.num_paginas = data.num_paginas;
        self.autor_id = data.autor_id;
        self.updated_at = now;
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.activo = false;
        self.updated_at = now;
    }
}
