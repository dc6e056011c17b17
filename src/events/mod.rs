use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Stock level below which the listener raises a reorder warning.
const LOW_STOCK_THRESHOLD: i32 = 5;

/// Handle used by services and commands to publish domain events.
///
/// The sender is injected everywhere a mutation happens; tests hold the
/// receiving end and assert on what was emitted.
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

// The events that can occur in the system. Fired only after the owning
// transaction has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Lead events
    LeadCreated(Uuid),
    LeadUpdated(Uuid),
    LeadDeleted(Uuid),
    LeadConverted {
        lead_id: Uuid,
        customer_id: Uuid,
    },

    // Customer events
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    CustomerDeleted(Uuid),
    CustomerConvertedToLead {
        customer_id: Uuid,
        lead_id: Uuid,
    },

    // Order events
    OrderCreated(Uuid),
    OrderUpdated(Uuid),
    OrderDeleted(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        previous_status: String,
        new_status: String,
    },
    PaymentStatusChanged {
        order_id: Uuid,
        previous_status: String,
        new_status: String,
    },

    // Inventory events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    ProductStockChanged {
        product_id: Uuid,
        previous_stock: i32,
        new_stock: i32,
        reason: String,
    },
    CategoryCreated(Uuid),
    CategoryDeleted(Uuid),

    // Activity events
    ActivityCreated(Uuid),
    ActivityCompleted(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Event-listener loop: consumes the channel and runs the per-type reactions.
///
/// Runs as a background task so a slow reaction never blocks the request that
/// emitted the event. Reaction failures are logged, never propagated.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::LeadConverted {
                lead_id,
                customer_id,
            } => {
                if let Err(e) = handle_lead_converted(lead_id, customer_id).await {
                    warn!(
                        "Failed to handle lead converted event: lead_id={}, error={}",
                        lead_id, e
                    );
                }
            }
            Event::CustomerConvertedToLead {
                customer_id,
                lead_id,
            } => {
                info!(
                    "Customer {} reverted to lead {}; sync listeners notified",
                    customer_id, lead_id
                );
            }
            Event::OrderCreated(order_id) => {
                if let Err(e) = handle_order_created(order_id).await {
                    warn!(
                        "Failed to handle order created event: order_id={}, error={}",
                        order_id, e
                    );
                }
            }
            Event::OrderStatusChanged {
                order_id,
                previous_status,
                new_status,
            } => {
                info!(
                    "Order {} moved from {} to {}",
                    order_id, previous_status, new_status
                );
            }
            Event::PaymentStatusChanged {
                order_id,
                previous_status,
                new_status,
            } => {
                info!(
                    "Order {} payment moved from {} to {}",
                    order_id, previous_status, new_status
                );
            }
            Event::ProductStockChanged {
                product_id,
                previous_stock,
                new_stock,
                reason,
            } => {
                if let Err(e) =
                    handle_stock_changed(product_id, previous_stock, new_stock, &reason).await
                {
                    warn!(
                        "Failed to handle stock change: product_id={}, error={}",
                        product_id, e
                    );
                }
            }
            _ => {
                info!("No specific handler for event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Reaction hooks. The source wired its messaging/e-commerce sync glue here;
// that surface is out of scope, so these log what would have been triggered.

async fn handle_lead_converted(lead_id: Uuid, customer_id: Uuid) -> Result<(), String> {
    info!(
        "Processing lead conversion: lead {} became customer {}",
        lead_id, customer_id
    );
    Ok(())
}

async fn handle_order_created(order_id: Uuid) -> Result<(), String> {
    info!(
        "Processing order created event for order {}; notification trigger queued",
        order_id
    );
    Ok(())
}

async fn handle_stock_changed(
    product_id: Uuid,
    previous_stock: i32,
    new_stock: i32,
    reason: &str,
) -> Result<(), String> {
    info!(
        "Stock changed for product {}: {} -> {} ({})",
        product_id, previous_stock, new_stock, reason
    );

    if new_stock == 0 {
        warn!("Product {} is out of stock", product_id);
    } else if new_stock < LOW_STOCK_THRESHOLD {
        warn!(
            "Low inventory alert: product {} has only {} units remaining",
            product_id, new_stock
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let lead_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();
        sender.send(Event::LeadCreated(lead_id)).await.unwrap();
        sender
            .send(Event::LeadConverted {
                lead_id,
                customer_id,
            })
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(Event::LeadCreated(id)) if id == lead_id));
        assert!(
            matches!(rx.recv().await, Some(Event::LeadConverted { lead_id: l, customer_id: c }) if l == lead_id && c == customer_id)
        );
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::with_data("orphan".into())).await.is_err());
    }
}
