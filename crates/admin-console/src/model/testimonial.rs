use crate::resource::AdminResource;
use crate::schema::{Check, PayloadSchema};
use chrono::{DateTime, Utc};
use resource_sync::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestimonialStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl TestimonialStatus {
    pub const ALL: &'static [&'static str] = &["pending", "approved", "rejected"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestimonialStatus::Pending => "pending",
            TestimonialStatus::Approved => "approved",
            TestimonialStatus::Rejected => "rejected",
        }
    }
}

impl Display for TestimonialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client quote awaiting or past moderation.
///
/// Moderation writes go through the guarded endpoint: the public site only shows
/// approved testimonials, so the client may not flip the status itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub author: String,
    #[serde(default)]
    pub company: Option<String>,
    pub quote: String,
    pub rating: u8,
    #[serde(default)]
    pub status: TestimonialStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestimonialCreate {
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub quote: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TestimonialUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TestimonialStatus>,
}

impl AdminResource for Testimonial {
    const NAME: &'static str = "testimonials";
    const GUARDED: bool = true;

    type Create = TestimonialCreate;
    type Update = TestimonialUpdate;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn create_schema() -> PayloadSchema {
        PayloadSchema::new(Self::NAME)
            .required("author", Check::Text { max: 120 })
            .optional("company", Check::Text { max: 120 })
            .required("quote", Check::Text { max: 2_000 })
            .required("rating", Check::Rating { min: 1, max: 5 })
            .optional("status", Check::OneOf(TestimonialStatus::ALL))
    }
}
