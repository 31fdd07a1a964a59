//! # Blog Post Client
//!
//! Drafting and publishing. A post is created as a draft; [`BlogPostClient::publish`]
//! flips it live and stamps `published_at`.
use crate::clients::{AdminClient, RecordClient};
use crate::error::AdminError;
use crate::model::{BlogPost, BlogPostCreate, BlogPostUpdate};
use async_trait::async_trait;
use chrono::Utc;
use resource_sync::RecordId;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct BlogPostClient {
    inner: RecordClient<BlogPost>,
}

impl BlogPostClient {
    pub fn new(inner: RecordClient<BlogPost>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn create_post(&self, params: BlogPostCreate) -> Result<BlogPost, AdminError> {
        debug!("Sending request");
        self.inner.create(&params).await
    }

    #[instrument(skip(self))]
    pub async fn update_post(
        &self,
        id: RecordId,
        update: BlogPostUpdate,
    ) -> Result<BlogPost, AdminError> {
        debug!("Sending request");
        self.inner.update(&id, &update).await
    }

    #[instrument(skip(self))]
    pub async fn publish(&self, id: RecordId) -> Result<BlogPost, AdminError> {
        debug!("Sending request");
        let update = BlogPostUpdate {
            published: Some(true),
            published_at: Some(Utc::now()),
            ..BlogPostUpdate::default()
        };
        self.inner.update(&id, &update).await
    }
}

#[async_trait]
impl AdminClient<BlogPost> for BlogPostClient {
    fn inner(&self) -> &RecordClient<BlogPost> {
        &self.inner
    }
}
