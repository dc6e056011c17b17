use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::Command,
    db::DbPool,
    entities::customer,
    errors::ServiceError,
    events::{Event, EventSender},
    names,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateCustomerCommand {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub brand: Option<String>,
    pub notes: Option<String>,
    /// Free-form address payload, persisted as JSON text.
    pub address: Option<serde_json::Value>,
}

#[async_trait]
impl Command for CreateCustomerCommand {
    type Result = customer::Model;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let has_part = self.first_name.as_deref().map(str::trim).is_some_and(|s| !s.is_empty())
            || self.last_name.as_deref().map(str::trim).is_some_and(|s| !s.is_empty());
        let display_name = if has_part {
            Some(names::full_name(
                self.first_name.as_deref(),
                self.last_name.as_deref(),
            ))
        } else {
            self.name.clone()
        };

        let new_customer = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(self.first_name.clone()),
            last_name: Set(self.last_name.clone()),
            name: Set(display_name),
            email: Set(self.email.clone()),
            phone: Set(self.phone.clone()),
            company: Set(self.company.clone()),
            source: Set(self.source.clone()),
            brand: Set(self.brand.clone()),
            notes: Set(self.notes.clone()),
            address: Set(self.address.as_ref().map(|a| a.to_string())),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let saved = new_customer.insert(db_pool.as_ref()).await?;

        info!(customer_id = %saved.id, "Customer created");
        event_sender
            .send(Event::CustomerCreated(saved.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(saved)
    }
}
