use admin_console::clients::AdminClient;
use admin_console::config::ConsoleConfig;
use admin_console::lifecycle::AdminConsole;
use admin_console::model::{Contact, ContactCreate, TestimonialCreate};
use resource_sync::tracing::setup_tracing;
use resource_sync::{GuardedEndpoint, MemoryStore, RecordId};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Seeds two inquiries and a pending testimonial, as if left by earlier sessions.
fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        "contacts",
        "C1",
        1_700_000_000,
        json!({ "name": "Grace Hopper", "email": "grace@example.com", "message": "SOC 2 readiness?" }),
    );
    store.seed(
        "contacts",
        "C2",
        1_700_000_100,
        json!({ "name": "Alan Turing", "email": "alan@example.com", "message": "Spam, please ignore" }),
    );
    store
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = ConsoleConfig::load_or_default().map_err(|e| e.to_string())?;
    info!("Starting admin console against an in-memory store");

    // The in-memory store doubles as the guarded endpoint
    let store = seeded_store();
    let endpoint: Arc<dyn GuardedEndpoint> = store.clone();
    let console = AdminConsole::new(store.clone(), store.clone(), Some(endpoint), config);

    let mut inbox = console.list_view::<Contact>();
    let mut second = console.list_view::<Contact>();
    let dashboard = console.dashboard();

    let rows = inbox
        .wait_for(|s| s.revision >= 1)
        .await
        .map_err(|e| e.to_string())?;
    info!(count = rows.len(), "Inbox loaded");

    let span = tracing::info_span!("new_inquiry");
    let created = async {
        console
            .contacts
            .create_contact(ContactCreate {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                company: Some("Analytical Engines Ltd".to_string()),
                phone: None,
                message: "We need a GDPR gap assessment.".to_string(),
            })
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    info!(id = %created.id, "Inquiry created");

    let rows = inbox
        .wait_for(|s| s.collection.len() == 3 && !s.loading)
        .await
        .map_err(|e| e.to_string())?;
    let ids: Vec<_> = rows.iter().map(|c| c.id.to_string()).collect();
    info!(?ids, "Inbox after create");

    // Delete C2 through the confirmation dialog
    let span = tracing::info_span!("delete_inquiry");
    let deleted = async {
        inbox.request_delete(RecordId::from("C2"))?;
        inbox.confirm_delete().await
    }
    .instrument(span)
    .await;
    if let Err(e) = deleted {
        error!(error = %e, "Delete failed");
    }

    let rows = second
        .wait_for(|s| s.collection.len() == 2 && !s.loading)
        .await
        .map_err(|e| e.to_string())?;
    let ids: Vec<_> = rows.iter().map(|c| c.id.to_string()).collect();
    info!(?ids, "Second view converged");

    // Moderation goes through the guarded route
    let testimonial = console
        .testimonials
        .submit(TestimonialCreate {
            author: "Grace Hopper".to_string(),
            company: None,
            quote: "Clear, fast and thorough.".to_string(),
            rating: 5,
        })
        .await
        .map_err(|e| e.to_string())?;
    match console.testimonials.approve(testimonial.id.clone()).await {
        Ok(approved) => info!(id = %approved.id, status = %approved.status, "Testimonial moderated"),
        Err(e) => error!(error = %e, "Moderation failed"),
    }

    let summary = dashboard
        .wait_for_summary(|s| s.contacts == 2 && s.pending_testimonials == 0)
        .await
        .map_err(|e| e.to_string())?;
    info!(?summary, "Dashboard");

    let remaining = console.contacts.list().await.map_err(|e| e.to_string())?;
    info!(count = remaining.len(), "Contacts on the server");

    second.close();
    console.shutdown().await;
    info!("Application completed successfully");
    Ok(())
}
