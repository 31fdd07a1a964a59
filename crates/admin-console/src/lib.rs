//! # Admin Console
//!
//! The compliance-consulting site's back office, built on [`resource_sync`].
//!
//! - **[model]**: typed records for services, contacts, blog posts, form submissions and
//!   testimonials, with their create and update DTOs.
//! - **[schema]**: declarative payload rules; nothing invalid reaches the network.
//! - **[clients]**: typed wrappers (e.g. [`ContactClient`](clients::ContactClient)) over the
//!   mutation gateway.
//! - **[views]**: list views and the dashboard, each owning its own live caches.
//! - **[lifecycle]**: [`AdminConsole`](lifecycle::AdminConsole), which wires everything
//!   from a [`ConsoleConfig`](config::ConsoleConfig) and shuts it down.
//!
//! The binary in `main.rs` runs the whole flow against an in-memory store.

pub mod clients;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod resource;
pub mod schema;
pub mod views;

pub use error::AdminError;
pub use resource::AdminResource;
