use crate::clients::{AdminClient, RecordClient};
use crate::error::AdminError;
use crate::model::{Service, ServiceCreate, ServiceUpdate};
use async_trait::async_trait;
use resource_sync::RecordId;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct ServiceClient {
    inner: RecordClient<Service>,
}

impl ServiceClient {
    pub fn new(inner: RecordClient<Service>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn create_service(&self, params: ServiceCreate) -> Result<Service, AdminError> {
        debug!("Sending request");
        self.inner.create(&params).await
    }

    #[instrument(skip(self))]
    pub async fn update_service(
        &self,
        id: RecordId,
        update: ServiceUpdate,
    ) -> Result<Service, AdminError> {
        debug!("Sending request");
        self.inner.update(&id, &update).await
    }
}

#[async_trait]
impl AdminClient<Service> for ServiceClient {
    fn inner(&self) -> &RecordClient<Service> {
        &self.inner
    }
}
