use crate::resource::AdminResource;
use crate::schema::{Check, PayloadSchema};
use chrono::{DateTime, Utc};
use resource_sync::{Payload, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    New,
    Reviewed,
    Archived,
}

impl SubmissionStatus {
    pub const ALL: &'static [&'static str] = &["new", "reviewed", "archived"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::Reviewed => "reviewed",
            SubmissionStatus::Archived => "archived",
        }
    }
}

impl Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generic form post (assessment requests, newsletter sign-ups, downloads).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub form: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub data: Payload,
    #[serde(default)]
    pub status: SubmissionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSubmissionCreate {
    pub form: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub data: Payload,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormSubmissionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmissionStatus>,
}

impl AdminResource for FormSubmission {
    const NAME: &'static str = "form_submissions";

    type Create = FormSubmissionCreate;
    type Update = FormSubmissionUpdate;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn create_schema() -> PayloadSchema {
        PayloadSchema::new(Self::NAME)
            .required("form", Check::Text { max: 60 })
            .optional("email", Check::Email)
            .required("data", Check::Object)
            .optional("status", Check::OneOf(SubmissionStatus::ALL))
    }
}
