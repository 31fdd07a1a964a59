use crate::resource::AdminResource;
use crate::schema::{Check, PayloadSchema};
use chrono::{DateTime, Utc};
use resource_sync::{OrderBy, RecordId};
use serde::{Deserialize, Serialize};

/// A consulting service listed on the public site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceCreate {
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl AdminResource for Service {
    const NAME: &'static str = "services";

    type Create = ServiceCreate;
    type Update = ServiceUpdate;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn create_schema() -> PayloadSchema {
        PayloadSchema::new(Self::NAME)
            .required("title", Check::Text { max: 120 })
            .required("slug", Check::Slug)
            .optional("summary", Check::Text { max: 500 })
            .optional("category", Check::Text { max: 60 })
            .optional("published", Check::Bool)
    }

    /// Alphabetical, the way the public site lists them.
    fn order() -> OrderBy {
        OrderBy::asc("title")
    }
}
