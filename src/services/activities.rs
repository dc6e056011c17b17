use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{activity, interaction, opportunity},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{parse_status, ActivityKind, ActivityStatus, InteractionKind, OpportunityStage},
};

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateActivityRequest {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    pub kind: String,
    pub due_at: Option<DateTime<Utc>>,
    pub lead_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateActivityRequest {
    pub subject: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateInteractionRequest {
    pub kind: String,
    #[validate(length(min = 1, message = "Summary is required"))]
    pub summary: String,
    pub occurred_at: Option<DateTime<Utc>>,
    pub lead_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateOpportunityRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub stage: Option<String>,
    pub amount: Option<Decimal>,
    pub customer_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateOpportunityRequest {
    pub title: Option<String>,
    pub stage: Option<String>,
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Service for activity scheduling plus the interaction and opportunity logs.
#[derive(Clone)]
pub struct ActivityService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ActivityService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_activity(
        &self,
        request: CreateActivityRequest,
    ) -> Result<activity::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        let kind: ActivityKind = parse_status("activity kind", &request.kind)?;

        let saved = activity::ActiveModel {
            id: Set(Uuid::new_v4()),
            subject: Set(request.subject),
            kind: Set(kind.to_string()),
            status: Set(ActivityStatus::Pending.to_string()),
            due_at: Set(request.due_at),
            lead_id: Set(request.lead_id),
            customer_id: Set(request.customer_id),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db_pool.as_ref())
        .await?;

        info!(activity_id = %saved.id, kind = %saved.kind, "Activity created");
        self.event_sender
            .send(Event::ActivityCreated(saved.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_activity(&self, activity_id: Uuid) -> Result<activity::Model, ServiceError> {
        activity::Entity::find_by_id(activity_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Activity with ID {} not found", activity_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_activities(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<activity::Model>, u64), ServiceError> {
        let mut query = activity::Entity::find().order_by_asc(activity::Column::DueAt);
        if let Some(raw) = status {
            let wanted: ActivityStatus = parse_status("activity", &raw)?;
            query = query.filter(activity::Column::Status.eq(wanted.to_string()));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let activities = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((activities, total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_activity(
        &self,
        activity_id: Uuid,
        request: UpdateActivityRequest,
    ) -> Result<activity::Model, ServiceError> {
        let existing = self.get_activity(activity_id).await?;

        let kind = match &request.kind {
            Some(raw) => Some(parse_status::<ActivityKind>("activity kind", raw)?),
            None => None,
        };
        let status = match &request.status {
            Some(raw) => Some(parse_status::<ActivityStatus>("activity", raw)?),
            None => None,
        };

        let mut update: activity::ActiveModel = existing.into();
        if let Some(subject) = request.subject {
            update.subject = Set(subject);
        }
        if let Some(kind) = kind {
            update.kind = Set(kind.to_string());
        }
        if let Some(status) = status {
            update.status = Set(status.to_string());
        }
        if let Some(due_at) = request.due_at {
            update.due_at = Set(Some(due_at));
        }
        if let Some(notes) = request.notes {
            update.notes = Set(Some(notes));
        }
        update.updated_at = Set(Some(Utc::now()));

        Ok(update.update(self.db_pool.as_ref()).await?)
    }

    /// Stamps the activity completed and notifies listeners.
    #[instrument(skip(self))]
    pub async fn complete_activity(
        &self,
        activity_id: Uuid,
    ) -> Result<activity::Model, ServiceError> {
        let existing = self.get_activity(activity_id).await?;

        let mut update: activity::ActiveModel = existing.into();
        update.status = Set(ActivityStatus::Completed.to_string());
        update.updated_at = Set(Some(Utc::now()));
        let updated = update.update(self.db_pool.as_ref()).await?;

        info!(activity_id = %updated.id, "Activity completed");
        self.event_sender
            .send(Event::ActivityCompleted(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_activity(&self, activity_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_activity(activity_id).await?;
        existing.delete(self.db_pool.as_ref()).await?;
        Ok(())
    }

    #[instrument(skip(self, request))]
    pub async fn create_interaction(
        &self,
        request: CreateInteractionRequest,
    ) -> Result<interaction::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        let kind: InteractionKind = parse_status("interaction kind", &request.kind)?;

        let saved = interaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(kind.to_string()),
            summary: Set(request.summary),
            occurred_at: Set(request.occurred_at.unwrap_or_else(Utc::now)),
            lead_id: Set(request.lead_id),
            customer_id: Set(request.customer_id),
            created_at: Set(Utc::now()),
        }
        .insert(self.db_pool.as_ref())
        .await?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn list_interactions(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<interaction::Model>, u64), ServiceError> {
        let paginator = interaction::Entity::find()
            .order_by_desc(interaction::Column::OccurredAt)
            .paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let interactions = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((interactions, total))
    }

    #[instrument(skip(self))]
    pub async fn delete_interaction(&self, interaction_id: Uuid) -> Result<(), ServiceError> {
        let existing = interaction::Entity::find_by_id(interaction_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Interaction with ID {} not found",
                    interaction_id
                ))
            })?;
        existing.delete(self.db_pool.as_ref()).await?;
        Ok(())
    }

    #[instrument(skip(self, request))]
    pub async fn create_opportunity(
        &self,
        request: CreateOpportunityRequest,
    ) -> Result<opportunity::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        let stage = match &request.stage {
            Some(raw) => parse_status::<OpportunityStage>("opportunity", raw)?,
            None => OpportunityStage::Open,
        };

        let saved = opportunity::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title),
            stage: Set(stage.to_string()),
            amount: Set(request.amount),
            customer_id: Set(request.customer_id),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db_pool.as_ref())
        .await?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_opportunity(
        &self,
        opportunity_id: Uuid,
    ) -> Result<opportunity::Model, ServiceError> {
        opportunity::Entity::find_by_id(opportunity_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Opportunity with ID {} not found",
                    opportunity_id
                ))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_opportunities(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<opportunity::Model>, u64), ServiceError> {
        let paginator = opportunity::Entity::find()
            .order_by_desc(opportunity::Column::CreatedAt)
            .paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let opportunities = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((opportunities, total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_opportunity(
        &self,
        opportunity_id: Uuid,
        request: UpdateOpportunityRequest,
    ) -> Result<opportunity::Model, ServiceError> {
        let existing = self.get_opportunity(opportunity_id).await?;

        let stage = match &request.stage {
            Some(raw) => Some(parse_status::<OpportunityStage>("opportunity", raw)?),
            None => None,
        };

        let mut update: opportunity::ActiveModel = existing.into();
        if let Some(title) = request.title {
            update.title = Set(title);
        }
        if let Some(stage) = stage {
            update.stage = Set(stage.to_string());
        }
        if let Some(amount) = request.amount {
            update.amount = Set(Some(amount));
        }
        if let Some(notes) = request.notes {
            update.notes = Set(Some(notes));
        }
        update.updated_at = Set(Some(Utc::now()));

        Ok(update.update(self.db_pool.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_opportunity(&self, opportunity_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_opportunity(opportunity_id).await?;
        existing.delete(self.db_pool.as_ref()).await?;
        Ok(())
    }
}
