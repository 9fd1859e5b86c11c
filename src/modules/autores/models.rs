//! Wire shapes for the authors endpoints

use biblioteca_http::{FieldError, Validate};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{Author, AuthorData};
use crate::validation::FieldErrors;

/// Create and update payload
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRequest {
    #[schema(required = true, max_length = 100, example = "Ada")]
    pub nombre: Option<String>,
    #[schema(required = true, max_length = 100, example = "Lovelace")]
    pub apellido: Option<String>,
    #[schema(max_length = 80, example = "Británica")]
    pub nacionalidad: Option<String>,
    #[schema(example = "1815-12-10")]
    pub fecha_nacimiento: Option<NaiveDate>,
}

impl Validate for AuthorRequest {
    type Valid = AuthorData;

    fn validate(self) -> Result<AuthorData, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let nombre = errors.required_text("nombre", "El nombre", self.nombre, 100);
        let apellido = errors.required_text("apellido", "El apellido", self.apellido, 100);
        let nacionalidad =
            errors.optional_text("nacionalidad", "La nacionalidad", self.nacionalidad, 80);

        errors.finish(|| {
            Some(AuthorData {
                nombre: nombre?,
                apellido: apellido?,
                nacionalidad,
                fecha_nacimiento: self.fecha_nacimiento,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: i64,
    pub nombre: String,
    pub apellido: String,
    pub nacionalidad: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Author> for AuthorResponse {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id(),
            nombre: author.nombre().to_string(),
            apellido: author.apellido().to_string(),
            nacionalidad: author.nacionalidad().map(str::to_string),
            fecha_nacimiento: author.fecha_nacimiento(),
            activo: author.is_active(),
            created_at: author.created_at(),
            updated_at: author.updated_at(),
        }
    }
}
