use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, Set, TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    entities::{customer, lead},
    errors::ServiceError,
    events::{Event, EventSender},
    models::LeadStatus,
    names,
    services::customers::assert_removable,
};

/// Fallback first name when a customer record carries no parseable name.
const UNKNOWN_NAME: &str = "Unknown";

/// Reverses a conversion: re-creates the contact as a fresh lead and removes
/// the customer row.
///
/// The removal is subject to the same policy as `DELETE /customers/:id`: a
/// customer that owns orders cannot be taken off the books by either path.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertCustomerToLeadCommand {
    pub customer_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertCustomerToLeadResult {
    pub lead: lead::Model,
}

#[async_trait]
impl Command for ConvertCustomerToLeadCommand {
    type Result = ConvertCustomerToLeadResult;

    #[instrument(skip(self, db_pool, event_sender), fields(customer_id = %self.customer_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();

        let existing = customer::Entity::find_by_id(self.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer with ID {} not found", self.customer_id))
            })?;

        assert_removable(db, &existing).await?;

        let (first_name, last_name) = derive_name_parts(&existing);
        let display_name = Some(names::full_name(
            Some(first_name.as_str()),
            last_name.as_deref(),
        ));

        let customer_id = existing.id;
        let lead = db
            .transaction::<_, lead::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let new_lead = lead::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        first_name: Set(Some(first_name)),
                        last_name: Set(last_name),
                        name: Set(display_name),
                        email: Set(existing.email.clone()),
                        phone: Set(existing.phone.clone()),
                        company: Set(existing.company.clone()),
                        status: Set(LeadStatus::New.to_string()),
                        source: Set(existing.source.clone()),
                        brand: Set(existing.brand.clone()),
                        notes: Set(existing.notes.clone()),
                        converted_to_customer: Set(false),
                        converted_customer_id: Set(None),
                        created_at: Set(Utc::now()),
                        updated_at: Set(None),
                    }
                    .insert(txn)
                    .await?;

                    existing.delete(txn).await?;

                    Ok(new_lead)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            customer_id = %customer_id,
            lead_id = %lead.id,
            "Customer converted back to lead"
        );

        event_sender
            .send(Event::CustomerDeleted(customer_id))
            .await
            .map_err(ServiceError::EventError)?;
        event_sender
            .send(Event::LeadCreated(lead.id))
            .await
            .map_err(ServiceError::EventError)?;
        event_sender
            .send(Event::CustomerConvertedToLead {
                customer_id,
                lead_id: lead.id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ConvertCustomerToLeadResult { lead })
    }
}

/// Stored parts win; otherwise the display name is split on its first
/// whitespace; a customer with no usable name at all becomes "Unknown".
fn derive_name_parts(record: &customer::Model) -> (String, Option<String>) {
    if let Some(first) = record.first_name.as_deref().map(str::trim) {
        if !first.is_empty() {
            return (first.to_string(), record.last_name.clone());
        }
    }

    match record.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => names::split_full_name(name),
        _ => (UNKNOWN_NAME.to_string(), None),
    }
}
