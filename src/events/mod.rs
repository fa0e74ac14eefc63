use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Handle used by the deal coordinator to dispatch post-commit events.
///
/// Events are fire-and-forget: a full or closed channel is the dispatcher's
/// problem, never the submitting caller's.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// The events emitted after a deal transaction commits. Outbound collaborators
// (notification dispatch, spreadsheet sync) consume these; their failures are
// isolated from the committed deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    DealCommitted {
        deal_id: Uuid,
        source_mode: String,
        quantity_sold: Decimal,
        committed_at: DateTime<Utc>,
    },
    LotCreated {
        lot_id: Uuid,
        quantity: Decimal,
        source_deal_id: Option<Uuid>,
    },
    LotDepleted {
        lot_id: Uuid,
        deal_id: Uuid,
    },
    ReplenishmentFailed {
        deal_id: Uuid,
        reason: String,
    },
}

// Function to process incoming events and hand them to outbound dispatchers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::DealCommitted {
                deal_id,
                ref source_mode,
                quantity_sold,
                committed_at,
            } => {
                info!(
                    %deal_id,
                    source_mode = %source_mode,
                    %quantity_sold,
                    %committed_at,
                    "deal committed; notifying outbound dispatchers"
                );
            }
            Event::LotCreated {
                lot_id,
                quantity,
                source_deal_id,
            } => {
                info!(
                    %lot_id,
                    %quantity,
                    ?source_deal_id,
                    "inventory lot created"
                );
            }
            Event::LotDepleted { lot_id, deal_id } => {
                info!(%lot_id, %deal_id, "inventory lot exhausted and removed");
            }
            Event::ReplenishmentFailed { deal_id, ref reason } => {
                // The deal stays committed; restocking is retried out-of-band
                // via the consistency supervisor's backfill.
                error!(%deal_id, reason = %reason, "post-commit replenishment failed");
            }
        }
    }

    info!("Event processing loop stopped");
}
