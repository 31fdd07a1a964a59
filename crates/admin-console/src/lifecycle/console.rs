use crate::clients::{
    BlogPostClient, ContactClient, FormSubmissionClient, RecordClient, ServiceClient,
    TestimonialClient,
};
use crate::config::ConsoleConfig;
use crate::error::AdminError;
use crate::model::{BlogPost, Contact, FormSubmission, Service, Testimonial};
use crate::resource::AdminResource;
use crate::views::{Dashboard, ListView, LogSurface};
use resource_sync::{
    CacheHandle, ChangeFeed, ConfirmSurface, GuardedEndpoint, HttpEndpoint, RemoteStore,
    ResourceName, ResourceSpec, SyncClient,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// One wired admin session.
pub struct AdminConsole {
    pub services: ServiceClient,
    pub contacts: ContactClient,
    pub blog_posts: BlogPostClient,
    pub form_submissions: FormSubmissionClient,
    pub testimonials: TestimonialClient,
    sync: SyncClient,
    config: ConsoleConfig,
    surface: Arc<dyn ConfirmSurface>,
    handles: Mutex<Vec<CacheHandle>>,
}

impl AdminConsole {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        feed: Arc<dyn ChangeFeed>,
        endpoint: Option<Arc<dyn GuardedEndpoint>>,
        config: ConsoleConfig,
    ) -> Self {
        let guarded = guarded_resources(&config);
        let mut sync = SyncClient::new(store, feed, config.cache.clone());
        match endpoint {
            Some(endpoint) => {
                info!(guarded = ?guarded, "Guarded endpoint configured");
                sync = sync.with_guarded_endpoint(endpoint, guarded);
            }
            None if !guarded.is_empty() => {
                warn!(guarded = ?guarded, "No guarded endpoint, these resources are written to the store directly");
            }
            None => {}
        }

        let services = ServiceClient::new(record_client(&sync, &config));
        let contacts = ContactClient::new(record_client(&sync, &config));
        let blog_posts = BlogPostClient::new(record_client(&sync, &config));
        let form_submissions = FormSubmissionClient::new(record_client(&sync, &config));
        let testimonials = TestimonialClient::new(record_client(&sync, &config));

        Self {
            services,
            contacts,
            blog_posts,
            form_submissions,
            testimonials,
            sync,
            config,
            surface: Arc::new(LogSurface::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Builds the guarded endpoint from `config.endpoint`, if present.
    pub fn connect(
        store: Arc<dyn RemoteStore>,
        feed: Arc<dyn ChangeFeed>,
        config: ConsoleConfig,
    ) -> Result<Self, AdminError> {
        let endpoint = match &config.endpoint {
            Some(endpoint) => {
                let http = HttpEndpoint::new(
                    &endpoint.base_url,
                    endpoint.session_token.clone(),
                    Duration::from_millis(endpoint.timeout_ms),
                )?;
                Some(Arc::new(http) as Arc<dyn GuardedEndpoint>)
            }
            None => None,
        };
        Ok(Self::new(store, feed, endpoint, config))
    }

    /// Surface used by the delete dialogs of list views opened afterwards.
    pub fn with_surface(mut self, surface: Arc<dyn ConfirmSurface>) -> Self {
        self.surface = surface;
        self
    }

    pub fn sync(&self) -> &SyncClient {
        &self.sync
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// The resource's default spec with configuration overrides applied.
    pub fn spec_for<R: AdminResource>(&self) -> ResourceSpec {
        self.config.spec(R::spec())
    }

    pub fn list_view<R: AdminResource>(&self) -> ListView<R> {
        let view = ListView::open(&self.sync, self.spec_for::<R>(), self.surface.clone());
        self.track([view.handle()]);
        view
    }

    pub fn dashboard(&self) -> Dashboard {
        let dashboard = Dashboard::open(&self.sync, &self.config);
        self.track(dashboard.handles());
        dashboard
    }

    /// Caches opened through this console that are still open.
    pub fn open_caches(&self) -> usize {
        self.handles().iter().filter(|h| h.is_open()).count()
    }

    /// Closes every cache opened through this console and waits for their actors.
    pub async fn shutdown(self) {
        let handles = std::mem::take(&mut *self.handles());
        let count = handles.len();
        for handle in handles {
            handle.shutdown().await;
        }
        info!(caches = count, "Console shut down");
    }

    /// Registers new handles, forgetting those whose view already closed its cache.
    fn track(&self, opened: impl IntoIterator<Item = CacheHandle>) {
        let mut handles = self.handles();
        handles.retain(CacheHandle::is_open);
        handles.extend(opened);
    }

    fn handles(&self) -> MutexGuard<'_, Vec<CacheHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn record_client<R: AdminResource>(sync: &SyncClient, config: &ConsoleConfig) -> RecordClient<R> {
    RecordClient::new(
        sync.gateway().clone(),
        sync.fetcher().clone(),
        config.spec(R::spec()),
    )
}

fn guarded_resources(config: &ConsoleConfig) -> Vec<ResourceName> {
    [
        (Service::NAME, Service::GUARDED),
        (Contact::NAME, Contact::GUARDED),
        (BlogPost::NAME, BlogPost::GUARDED),
        (FormSubmission::NAME, FormSubmission::GUARDED),
        (Testimonial::NAME, Testimonial::GUARDED),
    ]
    .into_iter()
    .filter(|(name, default)| config.is_guarded(name, *default))
    .map(|(name, _)| ResourceName::from(name))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceOverride;
    use resource_sync::{MemoryStore, WriteRoute};

    #[test]
    fn test_guarded_defaults_and_overrides() {
        let mut config = ConsoleConfig::default();
        assert_eq!(guarded_resources(&config), vec![ResourceName::from("testimonials")]);

        config.resources.insert(
            "testimonials".into(),
            ResourceOverride {
                guarded: Some(false),
                ..ResourceOverride::default()
            },
        );
        config.resources.insert(
            "blog_posts".into(),
            ResourceOverride {
                guarded: Some(true),
                ..ResourceOverride::default()
            },
        );
        assert_eq!(guarded_resources(&config), vec![ResourceName::from("blog_posts")]);
    }

    #[tokio::test]
    async fn test_routes_follow_endpoint_presence() {
        let store = Arc::new(MemoryStore::new());
        let testimonials = ResourceName::from("testimonials");

        let without = AdminConsole::new(store.clone(), store.clone(), None, ConsoleConfig::default());
        assert_eq!(without.sync().gateway().route(&testimonials), WriteRoute::Store);

        let with = AdminConsole::new(
            store.clone(),
            store.clone(),
            Some(store.clone()),
            ConsoleConfig::default(),
        );
        assert_eq!(with.sync().gateway().route(&testimonials), WriteRoute::Guarded);
        assert_eq!(
            with.sync().gateway().route(&ResourceName::from("contacts")),
            WriteRoute::Store
        );
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_registered_cache() {
        let store = Arc::new(MemoryStore::new());
        let console = AdminConsole::new(store.clone(), store.clone(), None, ConsoleConfig::default());

        let contacts = console.list_view::<Contact>();
        let dashboard = console.dashboard();
        assert_eq!(console.open_caches(), 4);

        let handle = contacts.handle();
        console.shutdown().await;
        assert!(!handle.is_open());
        assert!(dashboard.handles().iter().all(|h| !h.is_open()));
    }

    #[tokio::test]
    async fn test_dropped_views_are_forgotten() {
        let store = Arc::new(MemoryStore::new());
        let console = AdminConsole::new(store.clone(), store.clone(), None, ConsoleConfig::default());

        for _ in 0..200 {
            drop(console.list_view::<Contact>());
        }
        let kept = console.list_view::<Contact>();
        assert_eq!(console.handles().len(), 1);
        assert_eq!(console.open_caches(), 1);

        drop(kept);
        let _dashboard = console.dashboard();
        assert_eq!(console.handles().len(), 3);
    }
}
