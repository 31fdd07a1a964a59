use crate::clients::{AdminClient, RecordClient};
use crate::error::AdminError;
use crate::model::{FormSubmission, FormSubmissionCreate, FormSubmissionUpdate, SubmissionStatus};
use async_trait::async_trait;
use resource_sync::RecordId;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct FormSubmissionClient {
    inner: RecordClient<FormSubmission>,
}

impl FormSubmissionClient {
    pub fn new(inner: RecordClient<FormSubmission>) -> Self {
        Self { inner }
    }

    /// Stores a submission as `new`.
    #[instrument(skip(self))]
    pub async fn record(&self, params: FormSubmissionCreate) -> Result<FormSubmission, AdminError> {
        debug!("Sending request");
        self.inner.create(&params).await
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: RecordId,
        status: SubmissionStatus,
    ) -> Result<FormSubmission, AdminError> {
        debug!("Sending request");
        let update = FormSubmissionUpdate {
            status: Some(status),
        };
        self.inner.update(&id, &update).await
    }
}

#[async_trait]
impl AdminClient<FormSubmission> for FormSubmissionClient {
    fn inner(&self) -> &RecordClient<FormSubmission> {
        &self.inner
    }
}
