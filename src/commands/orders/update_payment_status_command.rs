use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    entities::order,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{parse_status, PaymentStatus},
};

/// Moves an order's payment status, independently of fulfillment.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePaymentStatusCommand {
    pub order_id: Uuid,
    pub status: String,
    pub reason: Option<String>,
}

#[async_trait]
impl Command for UpdatePaymentStatusCommand {
    type Result = order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id, status = %self.status))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let new_status: PaymentStatus = parse_status("payment", &self.status)?;

        let db = db_pool.as_ref();
        let existing = order::Entity::find_by_id(self.order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with ID {} not found", self.order_id))
            })?;

        let previous_status = existing.payment_status.clone();
        let now = Utc::now();

        let notes = match &self.reason {
            Some(reason) => {
                let line = format!(
                    "[{}] payment: {} -> {} ({})",
                    now.to_rfc3339(),
                    previous_status,
                    new_status,
                    reason
                );
                Some(match &existing.notes {
                    Some(notes) => format!("{}\n{}", notes, line),
                    None => line,
                })
            }
            None => existing.notes.clone(),
        };

        let mut update: order::ActiveModel = existing.into();
        update.payment_status = Set(new_status.to_string());
        update.notes = Set(notes);
        update.updated_at = Set(Some(now));
        let updated = update.update(db).await?;

        info!(
            order_id = %updated.id,
            previous = %previous_status,
            new = %updated.payment_status,
            "Payment status updated"
        );

        event_sender
            .send(Event::PaymentStatusChanged {
                order_id: updated.id,
                previous_status,
                new_status: updated.payment_status.clone(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }
}
