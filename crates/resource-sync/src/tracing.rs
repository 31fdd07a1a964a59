//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden (`with_target(false)`); every event already carries
//! a `resource` field, which is what you filter and group by.
//!
//! ## What Gets Traced
//!
//! | Level | Events |
//! |-------|--------|
//! | `info` | cache opened / closed, subscribed, acknowledged writes, coordinator outcomes |
//! | `warn` | failed fetches, failed writes, lost or refused subscriptions |
//! | `debug` | every trigger, coalesced bursts, queued refetches, stale results dropped |
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run -p admin-console
//! RUST_LOG=resource_sync=debug cargo run -p admin-console
//! ```
//!
//! A contact arriving while the contacts view is open looks like this at `debug`:
//!
//! ```text
//! DEBUG Change signal resource=contacts coalesced=0
//! DEBUG Refetch resource=contacts reason="signal"
//! DEBUG select resource=contacts rows=3
//! DEBUG Fetched resource=contacts count=3
//! ```

/// Initializes the global subscriber. Call once, at program start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
