//! # Typed Resources
//!
//! The engine sees records as an id, a timestamp and an opaque payload. [`AdminResource`]
//! is where the console gives a resource its shape: the model records decode into, the
//! DTOs it is written with, the schemas those DTOs must pass, and how lists of it are
//! ordered and projected by default.

use crate::schema::PayloadSchema;
use resource_sync::{OrderBy, Projection, RecordId, ResourceName, ResourceSpec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

pub trait AdminResource: DeserializeOwned + Debug + Clone + Send + Sync + 'static {
    /// Remote collection name.
    const NAME: &'static str;

    /// Whether updates and deletes must go through the guarded endpoint.
    const GUARDED: bool = false;

    type Create: Serialize + Debug + Send + Sync;
    type Update: Serialize + Debug + Send + Sync;

    fn id(&self) -> &RecordId;

    fn create_schema() -> PayloadSchema;

    fn update_schema() -> PayloadSchema {
        Self::create_schema().partial()
    }

    fn order() -> OrderBy {
        OrderBy::default()
    }

    fn projection() -> Projection {
        Projection::All
    }

    fn resource() -> ResourceName {
        ResourceName::from(Self::NAME)
    }

    /// Default cache spec, before configuration overrides.
    fn spec() -> ResourceSpec {
        ResourceSpec::new(Self::NAME)
            .order_by(Self::order())
            .project(Self::projection())
    }
}
