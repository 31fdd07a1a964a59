use crate::clients::RecordClient;
use crate::error::AdminError;
use crate::resource::AdminResource;
use async_trait::async_trait;
use resource_sync::RecordId;

/// Standard reads and deletes for resource-specific clients.
#[async_trait]
pub trait AdminClient<R: AdminResource>: Send + Sync {
    /// Access the inner generic RecordClient.
    fn inner(&self) -> &RecordClient<R>;

    /// Fetch a record by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: RecordId) -> Result<Option<R>, AdminError> {
        tracing::debug!("Sending request");
        self.inner().get(&id).await
    }

    /// Every record, in the resource's list order.
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<R>, AdminError> {
        tracing::debug!("Sending request");
        self.inner().list().await
    }

    /// Delete a record by ID.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: RecordId) -> Result<(), AdminError> {
        tracing::debug!("Sending request");
        self.inner().delete(&id).await
    }
}
