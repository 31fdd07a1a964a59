//! # Contact Client
//!
//! Inbox operations for contact-form inquiries.
use crate::clients::{AdminClient, RecordClient};
use crate::error::AdminError;
use crate::model::{Contact, ContactCreate, ContactUpdate};
use async_trait::async_trait;
use resource_sync::RecordId;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct ContactClient {
    inner: RecordClient<Contact>,
}

impl ContactClient {
    pub fn new(inner: RecordClient<Contact>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn create_contact(&self, params: ContactCreate) -> Result<Contact, AdminError> {
        debug!("Sending request");
        self.inner.create(&params).await
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: RecordId) -> Result<Contact, AdminError> {
        debug!("Sending request");
        let update = ContactUpdate {
            read: Some(true),
            ..ContactUpdate::default()
        };
        self.inner.update(&id, &update).await
    }
}

#[async_trait]
impl AdminClient<Contact> for ContactClient {
    fn inner(&self) -> &RecordClient<Contact> {
        &self.inner
    }
}
