use crate::error::AdminError;
use crate::resource::AdminResource;
use resource_sync::{CollectionFetcher, MutationGateway, Payload, Record, RecordId, ResourceSpec, Schema};
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{instrument, warn};

/// Typed create/read/update/delete for one resource.
pub struct RecordClient<R> {
    gateway: MutationGateway,
    fetcher: CollectionFetcher,
    spec: ResourceSpec,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for RecordClient<R> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            fetcher: self.fetcher.clone(),
            spec: self.spec.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: AdminResource> RecordClient<R> {
    /// `spec` decides the order of [`list`](Self::list); its projection is ignored, since
    /// typed reads need every column.
    pub fn new(gateway: MutationGateway, fetcher: CollectionFetcher, spec: ResourceSpec) -> Self {
        Self {
            gateway,
            fetcher,
            spec: spec.project(resource_sync::Projection::All),
            _resource: PhantomData,
        }
    }

    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    #[instrument(skip(self, params), fields(resource = R::NAME))]
    pub async fn create(&self, params: &R::Create) -> Result<R, AdminError> {
        let payload = R::create_schema().parse(&encode::<R, _>(params)?)?;
        let record = self.gateway.create(&R::resource(), payload).await?;
        decode(&record)
    }

    #[instrument(skip(self, update), fields(resource = R::NAME, %id))]
    pub async fn update(&self, id: &RecordId, update: &R::Update) -> Result<R, AdminError> {
        self.patch(id, encode::<R, _>(update)?).await
    }

    /// Applies a raw partial payload, validated like an update.
    #[instrument(skip(self, patch), fields(resource = R::NAME, %id))]
    pub async fn patch(&self, id: &RecordId, patch: Payload) -> Result<R, AdminError> {
        let payload = R::update_schema().parse(&patch)?;
        let record = self.gateway.update(&R::resource(), id, payload).await?;
        decode(&record)
    }

    #[instrument(skip(self), fields(resource = R::NAME, %id))]
    pub async fn delete(&self, id: &RecordId) -> Result<(), AdminError> {
        self.gateway.delete(&R::resource(), id).await?;
        Ok(())
    }

    /// One full read, decoded. Rows that do not decode are logged and skipped.
    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn list(&self) -> Result<Vec<R>, AdminError> {
        let collection = self.fetcher.fetch(&self.spec).await?;
        Ok(collection
            .iter()
            .filter_map(|record| match decode::<R>(record) {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable row");
                    None
                }
            })
            .collect())
    }

    /// Reads are always whole-collection, so this is a [`list`](Self::list) and a lookup.
    #[instrument(skip(self), fields(resource = R::NAME, %id))]
    pub async fn get(&self, id: &RecordId) -> Result<Option<R>, AdminError> {
        let collection = self.fetcher.fetch(&self.spec).await?;
        collection.get(id).map(decode::<R>).transpose()
    }
}

pub(crate) fn encode<R: AdminResource, T: Serialize>(value: &T) -> Result<Payload, AdminError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(AdminError::Encode {
            resource: R::resource(),
            reason: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(AdminError::Encode {
            resource: R::resource(),
            reason: e.to_string(),
        }),
    }
}

pub(crate) fn decode<R: AdminResource>(record: &Record) -> Result<R, AdminError> {
    record.decode().map_err(|e| AdminError::Decode {
        resource: R::resource(),
        id: record.id.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Contact, ContactCreate, ContactUpdate};
    use resource_sync::{MemoryStore, StoreError, SyncError};
    use serde_json::json;
    use std::sync::Arc;

    fn client(store: &Arc<MemoryStore>) -> RecordClient<Contact> {
        RecordClient::new(
            MutationGateway::new(store.clone()),
            CollectionFetcher::new(store.clone()),
            Contact::spec(),
        )
    }

    fn create() -> ContactCreate {
        ContactCreate {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            company: None,
            phone: None,
            message: "We need an ISO 27001 gap analysis.".into(),
        }
    }

    #[tokio::test]
    async fn test_create_validates_writes_and_decodes() {
        let store = Arc::new(MemoryStore::new());
        let contacts = client(&store);

        let contact = contacts.create(&create()).await.unwrap();
        assert_eq!(contact.email, "ada@example.com");
        assert!(!contact.read);
        assert_eq!(store.records("contacts").len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_payload_never_reaches_the_store() {
        let store = Arc::new(MemoryStore::new());
        let contacts = client(&store);

        let err = contacts
            .create(&ContactCreate {
                email: "not an email".into(),
                ..create()
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.validation().and_then(|v| v.for_field("email")),
            Some("must be a valid email address")
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_sends_only_set_fields() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "contacts",
            "c1",
            1,
            json!({ "name": "Ada", "email": "ada@example.com", "message": "Hi", "company": "ACME" }),
        );
        let contacts = client(&store);

        let updated = contacts
            .update(
                &RecordId::from("c1"),
                &ContactUpdate {
                    read: Some(true),
                    ..ContactUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.read);
        assert_eq!(updated.company.as_deref(), Some("ACME"));
    }

    #[tokio::test]
    async fn test_get_and_missing_delete() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "contacts",
            "c1",
            1,
            json!({ "name": "Ada", "email": "ada@example.com", "message": "Hi" }),
        );
        let contacts = client(&store);

        let found = contacts.get(&RecordId::from("c1")).await.unwrap();
        assert_eq!(found.map(|c| c.name), Some("Ada".to_string()));
        assert!(contacts.get(&RecordId::from("zz")).await.unwrap().is_none());

        let err = contacts.delete(&RecordId::from("zz")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_skips_rows_that_do_not_decode() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "contacts",
            "c1",
            1,
            json!({ "name": "Ada", "email": "ada@example.com", "message": "Hi" }),
        );
        store.seed("contacts", "c2", 2, json!({ "name": "No email" }));
        let contacts = client(&store);

        let rows = contacts.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, RecordId::from("c1"));

        store.fail_next_read(StoreError::Unauthorized("session expired".into()));
        let err = contacts.list().await.unwrap_err();
        assert!(matches!(err, AdminError::Sync(SyncError::RemoteRead { .. })));
    }
}
