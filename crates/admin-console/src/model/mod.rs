//! Typed models for the console's resources.
//!
//! Each model decodes from a fetched record and carries its own create and update DTOs.
//! The update DTOs skip unset fields, so an update only sends what changed.

use crate::resource::AdminResource;

pub mod blog_post;
pub mod contact;
pub mod form_submission;
pub mod service;
pub mod testimonial;

pub use blog_post::*;
pub use contact::*;
pub use form_submission::*;
pub use service::*;
pub use testimonial::*;

/// Every resource the console manages.
pub const RESOURCE_NAMES: [&str; 5] = [
    Service::NAME,
    Contact::NAME,
    BlogPost::NAME,
    FormSubmission::NAME,
    Testimonial::NAME,
];
