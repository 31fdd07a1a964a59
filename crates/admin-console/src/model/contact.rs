use crate::resource::AdminResource;
use crate::schema::{Check, PayloadSchema};
use chrono::{DateTime, Utc};
use resource_sync::RecordId;
use serde::{Deserialize, Serialize};

/// An inquiry sent through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactCreate {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl AdminResource for Contact {
    const NAME: &'static str = "contacts";

    type Create = ContactCreate;
    type Update = ContactUpdate;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn create_schema() -> PayloadSchema {
        PayloadSchema::new(Self::NAME)
            .required("name", Check::Text { max: 120 })
            .required("email", Check::Email)
            .optional("company", Check::Text { max: 120 })
            .optional("phone", Check::Text { max: 40 })
            .required("message", Check::Text { max: 5_000 })
            .optional("read", Check::Bool)
    }
}
