//! # Typed Clients
//!
//! [`RecordClient`] is the generic, typed front of the mutation gateway: it encodes a DTO,
//! runs the resource's schema, writes through the gateway and decodes the acknowledged
//! record. The per-resource clients wrap one and add the operations the console actually
//! performs (mark a contact read, approve a testimonial, publish a post).
//!
//! Clients never touch a cache. A write they make reaches every open cache of the
//! resource through the invalidation bus, and through the change feed for everyone else.

pub mod admin_client;
pub mod blog_post_client;
pub mod contact_client;
pub mod form_submission_client;
pub mod record_client;
pub mod service_client;
pub mod testimonial_client;

pub use admin_client::AdminClient;
pub use blog_post_client::BlogPostClient;
pub use contact_client::ContactClient;
pub use form_submission_client::FormSubmissionClient;
pub use record_client::RecordClient;
pub use service_client::ServiceClient;
pub use testimonial_client::TestimonialClient;
