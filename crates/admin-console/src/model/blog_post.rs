use crate::resource::AdminResource;
use crate::schema::{Check, PayloadSchema};
use chrono::{DateTime, Utc};
use resource_sync::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPostCreate {
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BlogPostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl AdminResource for BlogPost {
    const NAME: &'static str = "blog_posts";

    type Create = BlogPostCreate;
    type Update = BlogPostUpdate;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn create_schema() -> PayloadSchema {
        PayloadSchema::new(Self::NAME)
            .required("title", Check::Text { max: 200 })
            .required("slug", Check::Slug)
            .optional("excerpt", Check::Text { max: 400 })
            .required("body", Check::Text { max: 100_000 })
            .optional("author", Check::Text { max: 120 })
            .optional("published", Check::Bool)
            .optional("published_at", Check::Timestamp)
    }
}
