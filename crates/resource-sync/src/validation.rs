//! # Validation Contract
//!
//! Schemas are synchronous `parse(input)` checks run by the callers of the
//! [`MutationGateway`](crate::MutationGateway) before any write is attempted. The gateway
//! itself never validates; a payload rejected here never reaches the network.

use crate::record::Payload;
use serde::Serialize;

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-by-field validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, thiserror::Error)]
#[error("validation failed{}", summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let fields: Vec<String> = errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect();
    format!(": {}", fields.join(", "))
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message attached to `field`, if it was rejected.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// A synchronous input check producing a typed value.
pub trait Schema {
    type Output;

    fn parse(&self, input: &Payload) -> Result<Self::Output, ValidationErrors>;
}

/// Reads a required, non-blank string field.
pub fn required_str(input: &Payload, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match input.get(field).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(_) => {
            errors.add(field, "must not be empty");
            None
        }
        None => {
            errors.add(field, "is required");
            None
        }
    }
}

/// Reads an optional string field; a present non-string value is an error.
pub fn optional_str(input: &Payload, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match input.get(field) {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(field, "must be a string");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_str_reports_missing_and_blank() {
        let mut input = Payload::new();
        input.insert("name".into(), json!("   "));
        let mut errors = ValidationErrors::new();
        assert!(required_str(&input, "name", &mut errors).is_none());
        assert!(required_str(&input, "email", &mut errors).is_none());
        assert_eq!(errors.for_field("name"), Some("must not be empty"));
        assert_eq!(errors.for_field("email"), Some("is required"));
        assert_eq!(
            errors.to_string(),
            "validation failed: name must not be empty, email is required"
        );
    }

    #[test]
    fn test_empty_errors_display_and_result() {
        let errors = ValidationErrors::new();
        assert_eq!(errors.to_string(), "validation failed");
        assert_eq!(errors.into_result(7), Ok(7));
    }
}
