//! # Dashboard
//!
//! The landing screen's counters. The dashboard opens its own caches for contacts, form
//! submissions and testimonials, projected down to the one column each counter needs, and
//! recomputes the summary from whatever those caches hold. It shares nothing with the
//! list views, which keep their own full-width caches of the same resources.

use crate::config::ConsoleConfig;
use crate::error::AdminError;
use crate::model::{Contact, FormSubmission, SubmissionStatus, Testimonial, TestimonialStatus};
use crate::resource::AdminResource;
use resource_sync::{
    CacheHandle, CacheState, Projection, Record, ResourceCache, ResourceSpec, SyncClient,
};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    pub contacts: usize,
    pub unread_contacts: usize,
    pub new_submissions: usize,
    pub pending_testimonials: usize,
}

pub struct Dashboard {
    contacts: ResourceCache,
    submissions: ResourceCache,
    testimonials: ResourceCache,
}

impl Dashboard {
    /// Opens the counter caches. Configured orders apply; the projections are fixed.
    pub fn open(sync: &SyncClient, config: &ConsoleConfig) -> Self {
        let spec = |base: ResourceSpec, column: &str| {
            config.spec(base).project(Projection::columns([column]))
        };
        Self {
            contacts: sync.open(spec(Contact::spec(), "read")),
            submissions: sync.open(spec(FormSubmission::spec(), "status")),
            testimonials: sync.open(spec(Testimonial::spec(), "status")),
        }
    }

    pub fn specs(&self) -> [&ResourceSpec; 3] {
        [
            self.contacts.spec(),
            self.submissions.spec(),
            self.testimonials.spec(),
        ]
    }

    pub fn summary(&self) -> DashboardSummary {
        summarize(
            &self.contacts.state(),
            &self.submissions.state(),
            &self.testimonials.state(),
        )
    }

    /// Waits for the first successful fetch of every counter's cache.
    pub async fn wait_until_loaded(&self) -> Result<DashboardSummary, AdminError> {
        let contacts = self.contacts.wait_for(|s| s.revision >= 1).await?;
        let submissions = self.submissions.wait_for(|s| s.revision >= 1).await?;
        let testimonials = self.testimonials.wait_for(|s| s.revision >= 1).await?;
        Ok(summarize(&contacts, &submissions, &testimonials))
    }

    /// Waits until the summary satisfies `predicate`.
    pub async fn wait_for_summary(
        &self,
        mut predicate: impl FnMut(&DashboardSummary) -> bool,
    ) -> Result<DashboardSummary, AdminError> {
        let mut contacts = self.contacts.watch();
        let mut submissions = self.submissions.watch();
        let mut testimonials = self.testimonials.watch();
        loop {
            let summary = self.summary();
            if predicate(&summary) {
                return Ok(summary);
            }
            let changed = tokio::select! {
                r = contacts.changed() => r,
                r = submissions.changed() => r,
                r = testimonials.changed() => r,
            };
            changed.map_err(|_| resource_sync::SyncError::CacheClosed)?;
        }
    }

    /// Any cache still fetching.
    pub fn is_loading(&self) -> bool {
        [&self.contacts, &self.submissions, &self.testimonials]
            .iter()
            .any(|cache| cache.state().loading)
    }

    pub fn refresh(&self) {
        self.contacts.refresh();
        self.submissions.refresh();
        self.testimonials.refresh();
    }

    pub fn handles(&self) -> Vec<CacheHandle> {
        vec![
            self.contacts.handle(),
            self.submissions.handle(),
            self.testimonials.handle(),
        ]
    }

    pub fn close(&mut self) {
        self.contacts.close();
        self.submissions.close();
        self.testimonials.close();
    }
}

fn summarize(
    contacts: &CacheState,
    submissions: &CacheState,
    testimonials: &CacheState,
) -> DashboardSummary {
    DashboardSummary {
        contacts: contacts.collection.len(),
        unread_contacts: count(contacts, |r| r.column("read") != Some(Value::Bool(true))),
        new_submissions: count(submissions, |r| {
            has_status(r, SubmissionStatus::default().as_str())
        }),
        pending_testimonials: count(testimonials, |r| {
            has_status(r, TestimonialStatus::default().as_str())
        }),
    }
}

fn count(state: &CacheState, predicate: impl Fn(&Record) -> bool) -> usize {
    state.collection.iter().filter(|r| predicate(r)).count()
}

/// A row without a status has the default one.
fn has_status(record: &Record, status: &str) -> bool {
    match record.column("status") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s == status,
        Some(_) => false,
    }
}
