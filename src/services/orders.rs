use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::orders::{
        CreateOrderCommand, CreateOrderItem, CreateOrderResult, UpdateOrderStatusCommand,
        UpdatePaymentStatusCommand,
    },
    commands::Command,
    db::DbPool,
    entities::{order, order_item},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{parse_status, OrderStatus},
};

/// Request payload for order creation.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub lead_id: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<CreateOrderItem>,
    pub order_number: Option<String>,
    pub total_amount: Option<Decimal>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
}

/// Partial update payload for order details; status transitions go through
/// their dedicated operations.
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateOrderDetails {
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub total_amount: Option<Decimal>,
    pub brand: Option<String>,
}

/// An order together with its line items.
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Service for managing orders.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    default_brand: String,
    default_currency: String,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        default_brand: String,
        default_currency: String,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            default_brand,
            default_currency,
        }
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResult, ServiceError> {
        let command = CreateOrderCommand {
            customer_id: request.customer_id,
            lead_id: request.lead_id,
            items: request.items,
            order_number: request.order_number,
            total_amount: request.total_amount,
            shipping_address: request.shipping_address,
            notes: request.notes,
            fallback_brand: self.default_brand.clone(),
            currency: self.default_currency.clone(),
        };

        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let db = self.db_pool.as_ref();
        let found = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with ID {} not found", order_id))
            })?;

        let items = found
            .find_related(order_item::Entity)
            .all(db)
            .await?;

        Ok(OrderWithItems {
            order: found,
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
        status: Option<String>,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = order::Entity::find().order_by_desc(order::Column::OrderDate);
        if let Some(raw) = status {
            let wanted: OrderStatus = parse_status("order", &raw)?;
            query = query.filter(order::Column::Status.eq(wanted.to_string()));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((orders, total))
    }

    #[instrument(skip(self, details))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        details: UpdateOrderDetails,
    ) -> Result<order::Model, ServiceError> {
        details
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = self.db_pool.as_ref();
        let existing = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with ID {} not found", order_id))
            })?;

        let mut update: order::ActiveModel = existing.into();
        if let Some(shipping_address) = details.shipping_address {
            update.shipping_address = Set(Some(shipping_address));
        }
        if let Some(notes) = details.notes {
            update.notes = Set(Some(notes));
        }
        if let Some(total_amount) = details.total_amount {
            update.total_amount = Set(total_amount);
        }
        if let Some(brand) = details.brand {
            update.brand = Set(brand);
        }
        update.updated_at = Set(Some(chrono::Utc::now()));

        let updated = update.update(db).await?;

        info!(order_id = %updated.id, "Order details updated");
        self.event_sender
            .send(Event::OrderUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        status: String,
        reason: Option<String>,
    ) -> Result<order::Model, ServiceError> {
        UpdateOrderStatusCommand {
            order_id,
            status,
            reason,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        order_id: Uuid,
        status: String,
        reason: Option<String>,
    ) -> Result<order::Model, ServiceError> {
        UpdatePaymentStatusCommand {
            order_id,
            status,
            reason,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    /// Removes an order and its line items in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with ID {} not found", order_id))
            })?;

        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                order_item::Entity::delete_many()
                    .filter(order_item::Column::OrderId.eq(existing.id))
                    .exec(txn)
                    .await?;
                order::Entity::delete_by_id(existing.id).exec(txn).await?;
                Ok(())
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(service_err) => service_err,
        })?;

        info!(order_id = %order_id, "Order deleted");
        self.event_sender
            .send(Event::OrderDeleted(order_id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }
}
