//! # Views
//!
//! Screen-level owners of caches. Every view opens its own cache instances and closes them
//! when it goes away; two views showing the same resource never share one.

pub mod dashboard;
pub mod list_view;
pub mod surface;

pub use dashboard::{Dashboard, DashboardSummary};
pub use list_view::ListView;
pub use surface::LogSurface;
