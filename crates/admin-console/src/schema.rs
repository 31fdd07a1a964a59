//! # Payload Schemas
//!
//! Declarative field rules for write payloads. Each resource describes its create payload
//! once; the update schema is the same rules in partial mode, where absent fields are left
//! alone but present ones must still be valid. Unknown fields are always rejected.
//!
//! ```rust
//! use admin_console::schema::{Check, PayloadSchema};
//! use resource_sync::{Payload, Schema};
//! use serde_json::json;
//!
//! let schema = PayloadSchema::new("contacts")
//!     .required("email", Check::Email)
//!     .optional("company", Check::Text { max: 120 });
//!
//! let mut input = Payload::new();
//! input.insert("email".into(), json!("not-an-email"));
//! let errors = schema.parse(&input).unwrap_err();
//! assert_eq!(errors.for_field("email"), Some("must be a valid email address"));
//! ```

use regex::Regex;
use resource_sync::validation::{optional_str, required_str};
use resource_sync::{Payload, Schema, ValidationErrors};
use serde_json::Value;
use std::sync::LazyLock;

static EMAIL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

static SLUG: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$"));

fn is_match(pattern: &LazyLock<Result<Regex, regex::Error>>, value: &str) -> bool {
    match LazyLock::force(pattern) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

/// What a single field must look like.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Text { max: usize },
    Email,
    Slug,
    Rating { min: u64, max: u64 },
    OneOf(&'static [&'static str]),
    Bool,
    Object,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
struct FieldRule {
    field: &'static str,
    required: bool,
    check: Check,
}

impl FieldRule {
    fn string(&self, input: &Payload, errors: &mut ValidationErrors) -> Option<String> {
        if self.required {
            required_str(input, self.field, errors)
        } else {
            optional_str(input, self.field, errors)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }
    }

    fn read(&self, input: &Payload, errors: &mut ValidationErrors) -> Option<Value> {
        let field = self.field;
        match &self.check {
            Check::Text { max } => {
                let text = self.string(input, errors)?;
                if text.chars().count() > *max {
                    errors.add(field, format!("must be at most {max} characters"));
                    return None;
                }
                Some(Value::String(text))
            }
            Check::Email => {
                let email = self.string(input, errors)?;
                if !is_match(&EMAIL, &email) {
                    errors.add(field, "must be a valid email address");
                    return None;
                }
                Some(Value::String(email.to_lowercase()))
            }
            Check::Slug => {
                let slug = self.string(input, errors)?;
                if !is_match(&SLUG, &slug) {
                    errors.add(field, "must be lowercase words separated by hyphens");
                    return None;
                }
                Some(Value::String(slug))
            }
            Check::OneOf(allowed) => {
                let value = self.string(input, errors)?;
                if !allowed.iter().any(|a| *a == value) {
                    errors.add(field, format!("must be one of: {}", allowed.join(", ")));
                    return None;
                }
                Some(Value::String(value))
            }
            Check::Timestamp => {
                let value = self.string(input, errors)?;
                match chrono::DateTime::parse_from_rfc3339(&value) {
                    Ok(_) => Some(Value::String(value)),
                    Err(_) => {
                        errors.add(field, "must be an RFC 3339 timestamp");
                        None
                    }
                }
            }
            Check::Rating { min, max } => match self.present(input, errors)?.as_u64() {
                Some(n) if (*min..=*max).contains(&n) => Some(Value::from(n)),
                _ => {
                    errors.add(field, format!("must be a whole number from {min} to {max}"));
                    None
                }
            },
            Check::Bool => match self.present(input, errors)? {
                Value::Bool(b) => Some(Value::Bool(*b)),
                _ => {
                    errors.add(field, "must be true or false");
                    None
                }
            },
            Check::Object => {
                let value = self.present(input, errors)?;
                if !value.is_object() {
                    errors.add(field, "must be an object");
                    return None;
                }
                Some(value.clone())
            }
        }
    }

    /// Non-null value of the field; a missing required value is recorded.
    fn present<'a>(&self, input: &'a Payload, errors: &mut ValidationErrors) -> Option<&'a Value> {
        match input.get(self.field) {
            Some(Value::Null) | None => {
                if self.required {
                    errors.add(self.field, "is required");
                }
                None
            }
            Some(value) => Some(value),
        }
    }
}

/// Field rules for one resource's write payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadSchema {
    resource: &'static str,
    rules: Vec<FieldRule>,
    partial: bool,
}

impl PayloadSchema {
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            rules: Vec::new(),
            partial: false,
        }
    }

    pub fn required(mut self, field: &'static str, check: Check) -> Self {
        self.rules.push(FieldRule {
            field,
            required: true,
            check,
        });
        self
    }

    pub fn optional(mut self, field: &'static str, check: Check) -> Self {
        self.rules.push(FieldRule {
            field,
            required: false,
            check,
        });
        self
    }

    /// Same rules, but absent fields are allowed.
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }
}

impl Schema for PayloadSchema {
    type Output = Payload;

    /// Returns the normalized payload: strings trimmed, emails lowercased, blank optional
    /// strings dropped.
    fn parse(&self, input: &Payload) -> Result<Payload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut output = Payload::new();

        for key in input.keys() {
            if !self.rules.iter().any(|rule| rule.field == key.as_str()) {
                errors.add(key.clone(), "is not a known field");
            }
        }

        for rule in &self.rules {
            if !input.contains_key(rule.field) && (self.partial || !rule.required) {
                continue;
            }
            if let Some(value) = rule.read(input, &mut errors) {
                output.insert(rule.field.to_string(), value);
            }
        }

        if !errors.is_empty() {
            tracing::debug!(resource = self.resource, %errors, "Payload rejected");
        }
        errors.into_result(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    fn schema() -> PayloadSchema {
        PayloadSchema::new("testimonials")
            .required("author", Check::Text { max: 10 })
            .required("rating", Check::Rating { min: 1, max: 5 })
            .optional("status", Check::OneOf(&["pending", "approved"]))
            .optional("email", Check::Email)
    }

    #[test]
    fn test_valid_payload_is_normalized() {
        let parsed = schema()
            .parse(&payload(json!({
                "author": "  Ada ",
                "rating": 5,
                "email": "Ada@Example.com",
                "status": "pending"
            })))
            .unwrap();
        assert_eq!(parsed["author"], json!("Ada"));
        assert_eq!(parsed["email"], json!("ada@example.com"));
        assert_eq!(parsed["rating"], json!(5));
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let errors = schema()
            .parse(&payload(json!({
                "author": "a much too long name",
                "rating": 9,
                "status": "deleted",
                "email": "nope",
                "extra": true
            })))
            .unwrap_err();
        assert_eq!(errors.errors.len(), 5);
        assert_eq!(errors.for_field("extra"), Some("is not a known field"));
        assert_eq!(errors.for_field("rating"), Some("must be a whole number from 1 to 5"));
        assert!(errors.for_field("author").is_some());
        assert!(errors.for_field("status").is_some());
        assert!(errors.for_field("email").is_some());
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = schema().parse(&Payload::new()).unwrap_err();
        assert_eq!(errors.for_field("author"), Some("is required"));
        assert_eq!(errors.for_field("rating"), Some("is required"));
    }

    #[test]
    fn test_partial_mode_skips_absent_fields() {
        let partial = schema().partial();
        let parsed = partial.parse(&payload(json!({ "status": "approved" }))).unwrap();
        assert_eq!(parsed, payload(json!({ "status": "approved" })));

        let errors = partial.parse(&payload(json!({ "author": "" }))).unwrap_err();
        assert_eq!(errors.for_field("author"), Some("must not be empty"));
    }

    #[test]
    fn test_slug_and_timestamp_formats() {
        let schema = PayloadSchema::new("blog_posts")
            .required("slug", Check::Slug)
            .optional("published_at", Check::Timestamp);
        assert!(schema
            .parse(&payload(json!({ "slug": "gdpr-basics", "published_at": "2024-05-01T10:00:00Z" })))
            .is_ok());
        let errors = schema
            .parse(&payload(json!({ "slug": "GDPR Basics", "published_at": "yesterday" })))
            .unwrap_err();
        assert!(errors.for_field("slug").is_some());
        assert!(errors.for_field("published_at").is_some());
    }
}
