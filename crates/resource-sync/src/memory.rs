//! # In-Memory Store & Testing Guide
//!
//! [`MemoryStore`] implements [`RemoteStore`], [`ChangeFeed`] and [`GuardedEndpoint`]
//! entirely in memory. It backs the unit tests, the integration suites and the demo
//! binary, and it can inject the failures that are hard to reproduce against a hosted
//! database.
//!
//! ## When to use what
//!
//! | Need | Tool |
//! |------|------|
//! | Seed rows without emitting signals | [`MemoryStore::seed`] |
//! | Simulate another session's write | [`RemoteStore::insert`] / `update` / `delete` |
//! | Simulate a bare notification | [`MemoryStore::notify`] |
//! | Keep a fetch in flight | [`MemoryStore::hold_reads`] + [`ReadGate::release`] |
//! | Break the next read, write or subscribe | `fail_next_read` / `fail_next_write` / `fail_next_subscribe` |
//! | Drop the realtime connection | [`MemoryStore::close_feeds`] |
//! | Count network round trips | [`MemoryStore::read_count`] |
//!
//! ## Holding fetches in flight
//!
//! ```rust
//! use resource_sync::{MemoryStore, ResourceSpec, CollectionFetcher};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let gate = store.hold_reads();
//!     let fetcher = CollectionFetcher::new(store.clone());
//!
//!     let read = tokio::spawn(async move { fetcher.fetch(&ResourceSpec::new("contacts")).await });
//!     gate.release(1);
//!     assert!(read.await.unwrap().unwrap().is_empty());
//!     assert_eq!(store.read_count(), 1);
//! }
//! ```

use crate::endpoint::{EndpointError, GuardedEndpoint};
use crate::error::StoreError;
use crate::record::{Payload, Record, RecordId};
use crate::resource::{Projection, ResourceName, SelectQuery};
use crate::store::{ChangeFeed, ChangeSignal, RemoteStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, Semaphore};
use tracing::debug;

const FEED_CAPACITY: usize = 64;

#[derive(Default)]
struct Inner {
    tables: HashMap<ResourceName, Vec<Record>>,
    feeds: HashMap<ResourceName, broadcast::Sender<ChangeSignal>>,
    read_failures: VecDeque<StoreError>,
    write_failures: VecDeque<StoreError>,
    subscribe_failures: VecDeque<StoreError>,
    gate: Option<Arc<Semaphore>>,
    last_created: Option<DateTime<Utc>>,
    signals_per_write: usize,
}

/// In-process stand-in for the hosted relational store and its realtime feed.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocks reads until permits are released. Dropping the gate lets every read through.
pub struct ReadGate {
    semaphore: Arc<Semaphore>,
}

impl ReadGate {
    /// Lets `reads` more reads complete, in arrival order.
    pub fn release(&self, reads: usize) {
        self.semaphore.add_permits(reads);
    }
}

impl Drop for ReadGate {
    fn drop(&mut self) {
        self.semaphore.close();
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                signals_per_write: 1,
                ..Inner::default()
            }),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a row directly, without emitting a change signal.
    ///
    /// `fields` must be a JSON object; `created_secs` is seconds since the epoch.
    pub fn seed(&self, resource: &str, id: &str, created_secs: i64, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Payload::new(),
        };
        let created_at = Utc
            .timestamp_opt(created_secs, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let record = Record::new(id, created_at, fields);
        self.inner()
            .tables
            .entry(ResourceName::from(resource))
            .or_default()
            .push(record);
    }

    /// Current rows of `resource` in insertion order.
    pub fn records(&self, resource: &str) -> Vec<Record> {
        self.inner()
            .tables
            .get(&ResourceName::from(resource))
            .cloned()
            .unwrap_or_default()
    }

    /// Emits change signals for `resource` as if a write had happened.
    pub fn notify(&self, resource: &ResourceName) {
        let inner = self.inner();
        Self::emit(&inner, resource);
    }

    fn emit(inner: &Inner, resource: &ResourceName) {
        if let Some(feed) = inner.feeds.get(resource) {
            for _ in 0..inner.signals_per_write {
                let _ = feed.send(ChangeSignal);
            }
        }
    }

    /// Number of signals each write produces. Real feeds may send more than one.
    pub fn set_signals_per_write(&self, signals: usize) {
        self.inner().signals_per_write = signals;
    }

    /// Starts holding reads at a gate with no permits.
    pub fn hold_reads(&self) -> ReadGate {
        let semaphore = Arc::new(Semaphore::new(0));
        self.inner().gate = Some(semaphore.clone());
        ReadGate { semaphore }
    }

    pub fn fail_next_read(&self, error: StoreError) {
        self.inner().read_failures.push_back(error);
    }

    pub fn fail_next_write(&self, error: StoreError) {
        self.inner().write_failures.push_back(error);
    }

    pub fn fail_next_subscribe(&self, error: StoreError) {
        self.inner().subscribe_failures.push_back(error);
    }

    /// Drops every realtime feed; open subscriptions see the feed end.
    pub fn close_feeds(&self) {
        self.inner().feeds.clear();
    }

    /// Number of `select` calls issued so far, including failed ones.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of acknowledged writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn next_created_at(inner: &mut Inner) -> DateTime<Utc> {
        let now = Utc::now();
        let created = match inner.last_created {
            Some(last) if last >= now => last + ChronoDuration::microseconds(1),
            _ => now,
        };
        inner.last_created = Some(created);
        created
    }

    fn not_found(resource: &ResourceName, id: &RecordId) -> StoreError {
        StoreError::NotFound {
            resource: resource.clone(),
            id: id.clone(),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Record>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let gate = self.inner().gate.clone();
        if let Some(gate) = gate {
            // A closed gate means the test dropped it: let the read through.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut inner = self.inner();
        if let Some(err) = inner.read_failures.pop_front() {
            return Err(err);
        }
        let mut rows = inner
            .tables
            .get(&query.resource)
            .cloned()
            .unwrap_or_default();
        rows.sort_by(|a, b| query.order.compare(a, b));
        if let Projection::Columns(_) = &query.projection {
            for row in &mut rows {
                row.fields.retain(|column, _| query.projection.includes(column));
            }
        }
        debug!(resource = %query.resource, rows = rows.len(), "select");
        Ok(rows)
    }

    async fn insert(&self, resource: &ResourceName, mut payload: Payload) -> Result<Record, StoreError> {
        let mut inner = self.inner();
        if let Some(err) = inner.write_failures.pop_front() {
            return Err(err);
        }
        let id = match payload.remove("id") {
            Some(Value::String(id)) => RecordId(id),
            _ => RecordId::generate(),
        };
        payload.remove("created_at");
        let created_at = Self::next_created_at(&mut inner);
        let record = Record::new(id, created_at, payload);
        inner
            .tables
            .entry(resource.clone())
            .or_default()
            .push(record.clone());
        Self::emit(&inner, resource);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn update(
        &self,
        resource: &ResourceName,
        id: &RecordId,
        mut payload: Payload,
    ) -> Result<Record, StoreError> {
        let mut inner = self.inner();
        if let Some(err) = inner.write_failures.pop_front() {
            return Err(err);
        }
        payload.remove("id");
        payload.remove("created_at");
        let record = inner
            .tables
            .get_mut(resource)
            .and_then(|rows| rows.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| Self::not_found(resource, id))?;
        record.fields.extend(payload);
        let updated = record.clone();
        Self::emit(&inner, resource);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(updated)
    }

    async fn delete(&self, resource: &ResourceName, id: &RecordId) -> Result<(), StoreError> {
        let mut inner = self.inner();
        if let Some(err) = inner.write_failures.pop_front() {
            return Err(err);
        }
        let rows = inner
            .tables
            .get_mut(resource)
            .ok_or_else(|| Self::not_found(resource, id))?;
        let before = rows.len();
        rows.retain(|r| &r.id != id);
        if rows.len() == before {
            return Err(Self::not_found(resource, id));
        }
        Self::emit(&inner, resource);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for MemoryStore {
    async fn subscribe(
        &self,
        resource: &ResourceName,
    ) -> Result<broadcast::Receiver<ChangeSignal>, StoreError> {
        let mut inner = self.inner();
        if let Some(err) = inner.subscribe_failures.pop_front() {
            return Err(err);
        }
        let feed = inner
            .feeds
            .entry(resource.clone())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0);
        Ok(feed.subscribe())
    }
}

fn to_endpoint_error(err: StoreError) -> EndpointError {
    match err {
        StoreError::NotFound { resource, id } => EndpointError::Status {
            status: 404,
            message: format!("{resource} {id} not found"),
        },
        StoreError::Unauthorized(message) => EndpointError::Status {
            status: 403,
            message,
        },
        other => EndpointError::Status {
            status: 500,
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl GuardedEndpoint for MemoryStore {
    async fn put(
        &self,
        resource: &ResourceName,
        id: &RecordId,
        payload: Payload,
    ) -> Result<Record, EndpointError> {
        RemoteStore::update(self, resource, id, payload)
            .await
            .map_err(to_endpoint_error)
    }

    async fn delete(&self, resource: &ResourceName, id: &RecordId) -> Result<(), EndpointError> {
        RemoteStore::delete(self, resource, id)
            .await
            .map_err(to_endpoint_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::OrderBy;
    use serde_json::json;

    fn query(resource: &str) -> SelectQuery {
        SelectQuery {
            resource: resource.into(),
            projection: Projection::All,
            order: OrderBy::default(),
        }
    }

    #[tokio::test]
    async fn test_writes_emit_signals() {
        let store = MemoryStore::new();
        let resource = ResourceName::from("contacts");
        let mut feed = store.subscribe(&resource).await.unwrap();

        let mut payload = Payload::new();
        payload.insert("email".into(), json!("a@example.com"));
        let record = store.insert(&resource, payload).await.unwrap();
        assert_eq!(feed.recv().await.unwrap(), ChangeSignal);

        RemoteStore::delete(&store, &resource, &record.id).await.unwrap();
        assert_eq!(feed.recv().await.unwrap(), ChangeSignal);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_inserts_are_strictly_increasing_in_time() {
        let store = MemoryStore::new();
        let resource = ResourceName::from("blog_posts");
        let a = store.insert(&resource, Payload::new()).await.unwrap();
        let b = store.insert(&resource, Payload::new()).await.unwrap();
        assert!(b.created_at > a.created_at);

        let rows = store.select(&query("blog_posts")).await.unwrap();
        assert_eq!(rows[0].id, b.id);
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let store = MemoryStore::new();
        let resource = ResourceName::from("services");
        let err = RemoteStore::delete(&store, &resource, &"nope".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let err = GuardedEndpoint::put(&store, &resource, &"nope".into(), Payload::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed_once() {
        let store = MemoryStore::new();
        store.fail_next_read(StoreError::Transport("reset".into()));
        assert!(store.select(&query("contacts")).await.is_err());
        assert!(store.select(&query("contacts")).await.is_ok());
        assert_eq!(store.read_count(), 2);
    }
}
