use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionError, TransactionTrait};
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
};

lazy_static! {
    static ref LEAD_CONVERSIONS: IntCounter = register_int_counter!(
        "crm_lead_conversions_total",
        "Total number of leads converted into customers"
    )
    .expect("metric can be created");
}

/// Converts a lead into a customer.
///
/// Idempotent: a lead that already carries its conversion markers returns the
/// recorded pair without touching the database. The insert/update pair runs in
/// one transaction, so a failure cannot leave a customer row behind with an
/// unconverted lead.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertLeadCommand {
    pub lead_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertLeadResult {
    pub lead: lead::Model,
    pub customer: customer::Model,
}

#[async_trait]
impl Command for ConvertLeadCommand {
    type Result = ConvertLeadResult;

    #[instrument(skip(self, db_pool, event_sender), fields(lead_id = %self.lead_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();

        let existing = lead::Entity::find_by_id(self.lead_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Lead with ID {} not found", self.lead_id))
            })?;

        if existing.converted_to_customer {
            return self.already_converted(db, existing).await;
        }

        let (lead, new_customer) = self.convert(db, existing).await?;

        info!(
            lead_id = %lead.id,
            customer_id = %new_customer.id,
            "Lead converted to customer"
        );
        LEAD_CONVERSIONS.inc();

        event_sender
            .send(Event::LeadConverted {
                lead_id: lead.id,
                customer_id: new_customer.id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ConvertLeadResult {
            lead,
            customer: new_customer,
        })
    }
}

impl ConvertLeadCommand {
    /// Short-circuit path: the conversion markers are immutable, so the only
    /// valid answer is the pair recorded on the lead.
    async fn already_converted(
        &self,
        db: &DbPool,
        lead: lead::Model,
    ) -> Result<ConvertLeadResult, ServiceError> {
        let customer_id = lead.converted_customer_id.ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Lead {} is marked converted but has no customer reference",
                lead.id
            ))
        })?;

        let customer = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Customer {} recorded on converted lead {} no longer exists",
                    customer_id, lead.id
                ))
            })?;

        info!(lead_id = %lead.id, customer_id = %customer.id, "Lead already converted");
        Ok(ConvertLeadResult { lead, customer })
    }

    async fn convert(
        &self,
        db: &DbPool,
        existing: lead::Model,
    ) -> Result<(lead::Model, customer::Model), ServiceError> {
        // Prefer the stored parts; fall back to splitting the legacy display
        // name on its first whitespace.
        let (first_name, last_name) = match (&existing.first_name, &existing.last_name) {
            (None, None) => match existing.name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => {
                    let (first, last) = names::split_full_name(name);
                    (Some(first), last)
                }
                _ => (None, None),
            },
            (first, last) => (first.clone(), last.clone()),
        };

        let display_name = if first_name.is_some() || last_name.is_some() {
            Some(names::full_name(first_name.as_deref(), last_name.as_deref()))
        } else {
            existing.name.clone()
        };

        let notes = match (&existing.brand, &existing.notes) {
            (Some(brand), Some(notes)) => Some(format!("Brand interest: {}\n{}", brand, notes)),
            (Some(brand), None) => Some(format!("Brand interest: {}", brand)),
            (None, notes) => notes.clone(),
        };

        db.transaction::<_, (lead::Model, customer::Model), ServiceError>(move |txn| {
            Box::pin(async move {
                let now = Utc::now();

                let new_customer = customer::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    first_name: Set(first_name),
                    last_name: Set(last_name),
                    name: Set(display_name),
                    email: Set(existing.email.clone()),
                    phone: Set(existing.phone.clone()),
                    company: Set(existing.company.clone()),
                    source: Set(existing.source.clone()),
                    brand: Set(existing.brand.clone()),
                    notes: Set(notes),
                    address: Set(None),
                    created_at: Set(now),
                    updated_at: Set(None),
                }
                .insert(txn)
                .await?;

                let mut lead_update: lead::ActiveModel = existing.into();
                lead_update.converted_to_customer = Set(true);
                lead_update.converted_customer_id = Set(Some(new_customer.id));
                lead_update.status = Set(LeadStatus::Converted.to_string());
                lead_update.updated_at = Set(Some(now));
                let updated_lead = lead_update.update(txn).await?;

                Ok((updated_lead, new_customer))
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(service_err) => service_err,
        })
    }
}
