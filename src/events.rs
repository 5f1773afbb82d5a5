use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the catalog and order services. Delivery is
/// fire-and-forget: a failed send never fails the business operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SupplierCreated(Uuid),
    ArticleCreated(Uuid),
    ArticleUpdated(Uuid),
    ImportCompleted {
        created: u64,
        updated: u64,
        skipped: u64,
        suppliers_created: u64,
    },
    DraftCreated {
        order_id: Uuid,
        supplier_id: Uuid,
    },
    OrderStateChanged {
        order_id: Uuid,
        old_state: String,
        new_state: String,
    },
    OrderArchived(Uuid),
    OrderLinesReceived {
        order_id: Uuid,
        lines: Vec<(Uuid, Decimal)>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging a warning if the channel is closed or full.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Failed to send event: {}", e);
        }
    }
}

/// Creates an event channel pair with a bounded buffer.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Background consumer draining the event channel. Currently events are
/// surfaced in the logs only; downstream integrations subscribe here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        info!(?event, "domain event");
    }
    info!("Event channel closed; consumer shutting down");
}
