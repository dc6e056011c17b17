use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::leads::{ConvertLeadCommand, ConvertLeadResult, CreateLeadCommand},
    commands::Command,
    db::DbPool,
    entities::lead,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{parse_status, LeadStatus},
    names,
};

/// Partial update payload for a lead. Conversion markers are deliberately
/// absent: they are written once, by the conversion command.
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateLeadRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub brand: Option<String>,
    pub notes: Option<String>,
}

/// Service for managing leads and their conversion into customers.
#[derive(Clone)]
pub struct LeadService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LeadService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, command))]
    pub async fn create_lead(&self, command: CreateLeadCommand) -> Result<lead::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_lead(&self, lead_id: Uuid) -> Result<lead::Model, ServiceError> {
        lead::Entity::find_by_id(lead_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Lead with ID {} not found", lead_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_leads(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<lead::Model>, u64), ServiceError> {
        let mut query = lead::Entity::find().order_by_desc(lead::Column::CreatedAt);
        if let Some(raw) = status {
            let wanted: LeadStatus = parse_status("lead", &raw)?;
            query = query.filter(lead::Column::Status.eq(wanted.to_string()));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let leads = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((leads, total))
    }

    /// Applies a partial update and keeps the display name in sync with the
    /// name parts.
    #[instrument(skip(self, request))]
    pub async fn update_lead(
        &self,
        lead_id: Uuid,
        request: UpdateLeadRequest,
    ) -> Result<lead::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = self.db_pool.as_ref();
        let existing = self.get_lead(lead_id).await?;

        let status = match &request.status {
            Some(raw) => Some(parse_status::<LeadStatus>("lead", raw)?),
            None => None,
        };

        let mut merged = existing.clone();
        if let Some(first_name) = request.first_name.clone() {
            merged.first_name = Some(first_name);
        }
        if let Some(last_name) = request.last_name.clone() {
            merged.last_name = Some(last_name);
        }
        if let Some(name) = request.name.clone() {
            merged.name = Some(name);
        }
        names::ensure_name_field(&mut merged);

        let mut update: lead::ActiveModel = existing.into();
        update.first_name = Set(merged.first_name);
        update.last_name = Set(merged.last_name);
        update.name = Set(merged.name);
        if let Some(email) = request.email {
            update.email = Set(Some(email));
        }
        if let Some(phone) = request.phone {
            update.phone = Set(Some(phone));
        }
        if let Some(company) = request.company {
            update.company = Set(Some(company));
        }
        if let Some(status) = status {
            update.status = Set(status.to_string());
        }
        if let Some(source) = request.source {
            update.source = Set(Some(source));
        }
        if let Some(brand) = request.brand {
            update.brand = Set(Some(brand));
        }
        if let Some(notes) = request.notes {
            update.notes = Set(Some(notes));
        }
        update.updated_at = Set(Some(chrono::Utc::now()));

        let updated = update.update(db).await?;

        info!(lead_id = %updated.id, "Lead updated");
        self.event_sender
            .send(Event::LeadUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_lead(&self, lead_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_lead(lead_id).await?;
        lead::Entity::delete_by_id(existing.id)
            .exec(self.db_pool.as_ref())
            .await?;

        info!(lead_id = %lead_id, "Lead deleted");
        self.event_sender
            .send(Event::LeadDeleted(lead_id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn convert_lead(&self, lead_id: Uuid) -> Result<ConvertLeadResult, ServiceError> {
        ConvertLeadCommand { lead_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }
}
