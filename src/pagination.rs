//! Page requests and paged results shared by the listing endpoints.
//!
//! Pages are 0-based. `sort` takes `property[,asc|desc]` where the property
//! must appear in the endpoint's whitelist; the whitelist maps wire names to
//! storage columns so nothing from the query string reaches SQL.

use biblioteca_http::FieldError;
use biblioteca_kernel::settings::PaginationSettings;
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};

/// Raw `page`, `size` and `sort` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Ordering on a whitelisted column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: Direction,
}

/// Checked page request handed to the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn with_sort(self, column: &'static str, direction: Direction) -> Self {
        Self {
            sort: Some(Sort { column, direction }),
            ..self
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl PageQuery {
    /// Check the query against the configured bounds and a sort whitelist of
    /// `(property, column)` pairs. Sizes above the maximum are clamped.
    pub fn resolve(
        &self,
        settings: &PaginationSettings,
        sortable: &[(&str, &'static str)],
    ) -> Result<PageRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        let size = match self.size {
            Some(0) => {
                errors.push(FieldError::new(
                    "size",
                    "El tamaño de página debe ser al menos 1",
                ));
                settings.default_size
            }
            Some(size) => size.min(settings.max_size),
            None => settings.default_size,
        };

        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match parse_sort(raw, sortable) {
                Ok(sort) => Some(sort),
                Err(error) => {
                    errors.push(error);
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(PageRequest {
            page: self.page.unwrap_or(0),
            size,
            sort,
        })
    }
}

fn parse_sort(raw: &str, sortable: &[(&str, &'static str)]) -> Result<Sort, FieldError> {
    let (property, direction) = match raw.split_once(',') {
        Some((property, direction)) => (property.trim(), Some(direction.trim())),
        None => (raw, None),
    };

    let column = sortable
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, column)| *column)
        .ok_or_else(|| {
            FieldError::new(
                "sort",
                format!("No se puede ordenar por '{}'", property),
            )
        })?;

    let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("asc") => Direction::Asc,
        Some("desc") => Direction::Desc,
        Some(other) => {
            return Err(FieldError::new(
                "sort",
                format!("Dirección de orden inválida '{}'", other),
            ))
        }
    };

    Ok(Sort { column, direction })
}

/// One page of results plus the totals needed to navigate the rest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        u64::from(self.page) + 1 >= self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        })
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Page", 7)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("page", &self.page)?;
        state.serialize_field("size", &self.size)?;
        state.serialize_field("totalElements", &self.total_elements)?;
        state.serialize_field("totalPages", &self.total_pages())?;
        state.serialize_field("first", &self.is_first())?;
        state.serialize_field("last", &self.is_last())?;
        state.end()
    }
}

/// OpenAPI schema of a page whose items reference `item_schema`
pub fn page_schema(item_schema: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "content": {
                "type": "array",
                "items": { "$ref": format!("#/components/schemas/{}", item_schema) }
            },
            "page": { "type": "integer", "minimum": 0 },
            "size": { "type": "integer", "minimum": 1 },
            "totalElements": { "type": "integer" },
            "totalPages": { "type": "integer" },
            "first": { "type": "boolean" },
            "last": { "type": "boolean" }
        },
        "required": ["content", "page", "size", "totalElements", "totalPages", "first", "last"]
    })
}

/// OpenAPI parameters for `page`, `size` and `sort`
pub fn page_parameters() -> serde_json::Value {
    serde_json::json!([
        { "name": "page", "in": "query", "required": false, "schema": { "type": "integer", "minimum": 0, "default": 0 } },
        { "name": "size", "in": "query", "required": false, "schema": { "type": "integer", "minimum": 1 } },
        { "name": "sort", "in": "query", "required": false, "schema": { "type": "string" }, "description": "property[,asc|desc]" }
    ])
}
