//! Field checks shared by the request payloads

use biblioteca_http::FieldError;

/// Collects field errors while a payload is checked
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Non-blank text of at most `max` characters. `label` reads like
    /// "El nombre".
    pub fn required_text(
        &mut self,
        field: &'static str,
        label: &str,
        value: Option<String>,
        max: usize,
    ) -> Option<String> {
        match value {
            Some(text) if !text.trim().is_empty() => self.max_length(field, label, text, max),
            _ => {
                self.push(field, format!("{} es obligatorio", label));
                None
            }
        }
    }

    pub fn optional_text(
        &mut self,
        field: &'static str,
        label: &str,
        value: Option<String>,
        max: usize,
    ) -> Option<String> {
        value.and_then(|text| self.max_length(field, label, text, max))
    }

    fn max_length(
        &mut self,
        field: &'static str,
        label: &str,
        text: String,
        max: usize,
    ) -> Option<String> {
        if text.chars().count() > max {
            self.push(
                field,
                format!("{} no puede superar {} caracteres", label, max),
            );
            return None;
        }
        Some(text)
    }

    /// `Ok(value)` when nothing was recorded
    pub fn finish<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, Vec<FieldError>> {
        if !self.0.is_empty() {
            return Err(self.0);
        }
        // Every check passed, so the builder only sees present fields.
        value().ok_or(self.0)
    }
}
