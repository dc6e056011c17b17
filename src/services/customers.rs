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
    commands::customers::{
        ConvertCustomerToLeadCommand, ConvertCustomerToLeadResult, CreateCustomerCommand,
    },
    commands::Command,
    db::DbPool,
    entities::{customer, order},
    errors::ServiceError,
    events::{Event, EventSender},
    names,
};

/// Removal policy shared by deletion and customer→lead conversion: a customer
/// that owns orders stays on the books.
pub async fn assert_removable(db: &DbPool, record: &customer::Model) -> Result<(), ServiceError> {
    let order_count = order::Entity::find()
        .filter(order::Column::CustomerId.eq(record.id))
        .count(db)
        .await?;

    if order_count > 0 {
        return Err(ServiceError::Conflict(format!(
            "Customer {} has {} order(s) and cannot be removed",
            record.id, order_count
        )));
    }

    Ok(())
}

/// Partial update payload for a customer.
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
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
    pub address: Option<serde_json::Value>,
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, command))]
    pub async fn create_customer(
        &self,
        command: CreateCustomerCommand,
    ) -> Result<customer::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer with ID {} not found", customer_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let paginator = customer::Entity::find()
            .order_by_desc(customer::Column::CreatedAt)
            .paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((customers, total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = self.db_pool.as_ref();
        let existing = self.get_customer(customer_id).await?;

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

        let mut update: customer::ActiveModel = existing.into();
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
        if let Some(source) = request.source {
            update.source = Set(Some(source));
        }
        if let Some(brand) = request.brand {
            update.brand = Set(Some(brand));
        }
        if let Some(notes) = request.notes {
            update.notes = Set(Some(notes));
        }
        if let Some(address) = request.address {
            update.address = Set(Some(address.to_string()));
        }
        update.updated_at = Set(Some(chrono::Utc::now()));

        let updated = update.update(db).await?;

        info!(customer_id = %updated.id, "Customer updated");
        self.event_sender
            .send(Event::CustomerUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_customer(customer_id).await?;

        assert_removable(db, &existing).await?;

        existing.delete(db).await?;

        info!(customer_id = %customer_id, "Customer deleted");
        self.event_sender
            .send(Event::CustomerDeleted(customer_id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn convert_to_lead(
        &self,
        customer_id: Uuid,
    ) -> Result<ConvertCustomerToLeadResult, ServiceError> {
        ConvertCustomerToLeadCommand { customer_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Orders placed by the customer, newest first.
    #[instrument(skip(self))]
    pub async fn get_customer_orders(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_customer(customer_id).await?;

        let orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(existing.id))
            .order_by_desc(order::Column::OrderDate)
            .all(db)
            .await?;

        Ok(orders)
    }
}
