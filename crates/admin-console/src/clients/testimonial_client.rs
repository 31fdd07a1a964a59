//! # Testimonial Client
//!
//! Submission and moderation. Testimonials are a guarded resource, so `approve`,
//! `reject` and deletes are routed through the privileged endpoint by the gateway; this
//! client does not need to know.
use crate::clients::{AdminClient, RecordClient};
use crate::error::AdminError;
use crate::model::{Testimonial, TestimonialCreate, TestimonialStatus, TestimonialUpdate};
use async_trait::async_trait;
use resource_sync::RecordId;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct TestimonialClient {
    inner: RecordClient<Testimonial>,
}

impl TestimonialClient {
    pub fn new(inner: RecordClient<Testimonial>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn submit(&self, params: TestimonialCreate) -> Result<Testimonial, AdminError> {
        debug!("Sending request");
        self.inner.create(&params).await
    }

    #[instrument(skip(self))]
    pub async fn approve(&self, id: RecordId) -> Result<Testimonial, AdminError> {
        self.moderate(id, TestimonialStatus::Approved).await
    }

    #[instrument(skip(self))]
    pub async fn reject(&self, id: RecordId) -> Result<Testimonial, AdminError> {
        self.moderate(id, TestimonialStatus::Rejected).await
    }

    async fn moderate(
        &self,
        id: RecordId,
        status: TestimonialStatus,
    ) -> Result<Testimonial, AdminError> {
        debug!(%status, "Sending request");
        let update = TestimonialUpdate {
            status: Some(status),
            ..TestimonialUpdate::default()
        };
        self.inner.update(&id, &update).await
    }
}

#[async_trait]
impl AdminClient<Testimonial> for TestimonialClient {
    fn inner(&self) -> &RecordClient<Testimonial> {
        &self.inner
    }
}
