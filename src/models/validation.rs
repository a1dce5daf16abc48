//! Field-level validation for incoming records

use serde::Serialize;
use std::fmt;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors found for one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Error set holding exactly one field
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Ok when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Records that can check their own fields before hitting storage
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Require a non-blank value
pub fn require_text(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{} is required", field));
    }
}

/// Cap a value at `max` characters
pub fn max_chars(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("{} must be at most {} characters", field, max));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "title is required");
        errors.add("duration", "duration must not be negative");

        assert_eq!(
            errors.to_string(),
            "title: title is required, duration: duration must not be negative"
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_helpers() {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", "   ");
        max_chars(&mut errors, "bio", "ab", 1);
        max_chars(&mut errors, "bio", "ab", 2);

        assert_eq!(errors.fields().len(), 2);
        assert_eq!(errors.fields()[0].field, "name");
        assert_eq!(errors.fields()[1].field, "bio");
    }
}
