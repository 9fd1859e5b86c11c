use chrono::{DateTime, NaiveDate, Utc};

/// Author fields a client may set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorData {
    pub nombre: String,
    pub apellido: String,
    pub nacionalidad: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
}

/// Persisted author row.
///
/// Fields are read-only from outside; mutation goes through
/// [`Author::update_fields`] and [`Author::deactivate`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Author {
    id: i64,
    nombre: String,
    apellido: String,
    nacionalidad: Option<String>,
    fecha_nacimiento: Option<NaiveDate>,
    activo: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Author {
    /// Fresh active author as a store creates it
    pub fn create(id: i64, data: AuthorData, now: DateTime<Utc>) -> Self {
        Self {
            id,
            nombre: data.nombre,
            apellido: data.apellido,
            nacionalidad: data.nacionalidad,
            fecha_nacimiento: data.fecha_nacimiento,
            activo: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn nombre(&self) -> &str {
        &self.nombre
    }

    pub fn apellido(&self) -> &str {
        &self.apellido
    }

    pub fn nacionalidad(&self) -> Option<&str> {
        self.nacionalidad.as_deref()
    }

    pub fn fecha_nacimiento(&self) -> Option<NaiveDate> {
        self.fecha_nacimiento
    }

    pub fn is_active(&self) -> bool {
        self.activo
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Display name shown next to the author's books
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }

    /// Overwrite the editable fields. Id, creation time and active flag stay.
    pub fn update_fields(&mut self, data: AuthorData, now: DateTime<Utc>) {
        self.nombre = data.nombre;
        self.apellido = data.apellido;
        self.nacionalidad = data.nacionalidad;
        self.fecha_nacimiento = data.fecha_nacimiento;
        self.updated_at = now;
    }

    /// Soft delete. There is no way back to active.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.activo = false;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn data(nombre: &str, apellido: &str) -> AuthorData {
        AuthorData {
            nombre: nombre.to_string(),
            apellido: apellido.to_string(),
            nacionalidad: Some("Británica".to_string()),
            fecha_nacimiento: NaiveDate::from_ymd_opt(1815, 12, 10),
        }
    }

    #[test]
    fn new_authors_are_active() {
        let now = Utc::now();
        let author = Author::create(1, data("Ada", "Lovelace"), now);

        assert!(author.is_active());
        assert_eq!(author.created_at(), now);
        assert_eq!(author.updated_at(), now);
        assert_eq!(author.full_name(), "Ada Lovelace");
    }

    #[test]
    fn update_keeps_identity_and_creation_time() {
        let created = Utc::now();
        let later = created + Duration::seconds(30);
        let mut author = Author::create(7, data("Ada", "Lovelace"), created);

        author.update_fields(
            AuthorData {
                nombre: "Augusta Ada".to_string(),
                apellido: "King".to_string(),
                nacionalidad: None,
                fecha_nacimiento: None,
            },
            later,
        );

        assert_eq!(author.id(), 7);
        assert_eq!(author.nombre(), "Augusta Ada");
        assert_eq!(author.apellido(), "King");
        assert_eq!(author.nacionalidad(), None);
        assert_eq!(author.fecha_nacimiento(), None);
        assert_eq!(author.created_at(), created);
        assert_eq!(author.updated_at(), later);
        assert!(author.is_active());
    }

    #[test]
    fn deactivation_sticks() {
        let now = Utc::now();
        let mut author = Author::create(1, data("Ada", "Lovelace"), now);

        author.deactivate(now);
        author.update_fields(data("Ada", "Lovelace"), now);

        assert!(!author.is_active());
    }
}
