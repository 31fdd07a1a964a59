//! # Console Lifecycle
//!
//! Wiring and teardown for one admin session. [`AdminConsole`] is built once from the
//! injected backends and the loaded [`ConsoleConfig`](crate::config::ConsoleConfig):
//!
//! 1. **Backends**: the remote store, its change feed and, when configured, the guarded
//!    HTTP endpoint are passed in; nothing is a global.
//! 2. **Engine**: one [`SyncClient`](resource_sync::SyncClient) owns the fetcher, the
//!    change channel, the gateway and the session's invalidation bus.
//! 3. **Clients**: one typed client per resource, all writing through that gateway.
//! 4. **Views**: every list view and dashboard opened through the console registers its
//!    cache handles, so [`AdminConsole::shutdown`] can close them all and wait for their
//!    actors to stop.
//!
//! ```rust,ignore
//! let console = AdminConsole::connect(store.clone(), store, ConsoleConfig::load_or_default()?)?;
//! let mut contacts = console.list_view::<Contact>();
//! contacts.request_delete(id)?;
//! contacts.confirm_delete().await?;
//! console.shutdown().await;
//! ```
//!
//! Views opened through the console may outlive it; after `shutdown` their caches are
//! closed and show the empty state.

pub mod console;

pub use console::*;
