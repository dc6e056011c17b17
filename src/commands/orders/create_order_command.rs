use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::Command,
    db::DbPool,
    entities::{customer, order, order_item, product},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderStatus, PaymentStatus},
};

lazy_static! {
    static ref ORDER_CREATIONS: IntCounter = register_int_counter!(
        "crm_order_creations_total",
        "Total number of orders created"
    )
    .expect("metric can be created");
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderCommand {
    pub customer_id: Uuid,
    /// Originating lead, when the order traces back to one.
    pub lead_id: Option<Uuid>,
    #[validate]
    pub items: Vec<CreateOrderItem>,
    /// Generated when absent.
    pub order_number: Option<String>,
    /// Computed from the item subtotals when absent.
    pub total_amount: Option<Decimal>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    /// Brand stamped on the order when the customer carries none.
    pub fallback_brand: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderItem {
    pub product_id: Option<Uuid>,
    /// Snapshot name; defaults to the product's name when a product is referenced.
    pub product_name: Option<String>,
    pub sku: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Defaults to the product's current price when a product is referenced.
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Stock movement recorded while the transaction is open, emitted after commit.
struct StockChange {
    product_id: Uuid,
    previous_stock: i32,
    new_stock: i32,
}

#[async_trait]
impl Command for CreateOrderCommand {
    type Result = CreateOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(customer_id = %self.customer_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = db_pool.as_ref();

        let buyer = customer::Entity::find_by_id(self.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Customer with ID {} not found",
                    self.customer_id
                ))
            })?;

        let order_number = self
            .order_number
            .clone()
            .unwrap_or_else(generate_order_number);
        let brand = buyer
            .brand
            .clone()
            .unwrap_or_else(|| self.fallback_brand.clone());

        let (saved_order, saved_items, stock_changes) =
            self.persist(db, order_number, brand).await?;

        info!(
            order_id = %saved_order.id,
            order_number = %saved_order.order_number,
            customer_id = %saved_order.customer_id,
            items_count = saved_items.len(),
            "Order created"
        );
        ORDER_CREATIONS.inc();

        let reason = format!("order {}", saved_order.order_number);
        for change in &stock_changes {
            event_sender
                .send(Event::ProductStockChanged {
                    product_id: change.product_id,
                    previous_stock: change.previous_stock,
                    new_stock: change.new_stock,
                    reason: reason.clone(),
                })
                .await
                .map_err(ServiceError::EventError)?;
        }
        event_sender
            .send(Event::OrderCreated(saved_order.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(CreateOrderResult {
            order: saved_order,
            items: saved_items,
        })
    }
}

impl CreateOrderCommand {
    async fn persist(
        &self,
        db: &DbPool,
        order_number: String,
        brand: String,
    ) -> Result<(order::Model, Vec<order_item::Model>, Vec<StockChange>), ServiceError> {
        let customer_id = self.customer_id;
        let lead_id = self.lead_id;
        let items = self.items.clone();
        let supplied_total = self.total_amount;
        let shipping_address = self.shipping_address.clone();
        let notes = self.notes.clone();
        let currency = self.currency.clone();

        db.transaction::<_, (order::Model, Vec<order_item::Model>, Vec<StockChange>), ServiceError>(
            move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let order_id = Uuid::new_v4();

                    // Resolve each line against its product (when referenced)
                    // and compute the subtotal snapshot.
                    let mut item_models = Vec::with_capacity(items.len());
                    let mut decrements: Vec<(product::Model, i32)> = Vec::new();
                    let mut computed_total = Decimal::ZERO;

                    for item in &items {
                        let referenced = match item.product_id {
                            Some(product_id) => Some(
                                product::Entity::find_by_id(product_id)
                                    .one(txn)
                                    .await?
                                    .ok_or_else(|| {
                                        ServiceError::ValidationError(format!(
                                            "Order item references unknown product {}",
                                            product_id
                                        ))
                                    })?,
                            ),
                            None => None,
                        };

                        let product_name = item
                            .product_name
                            .clone()
                            .or_else(|| referenced.as_ref().map(|p| p.name.clone()))
                            .ok_or_else(|| {
                                ServiceError::ValidationError(
                                    "Order item needs a product_name when no product is referenced"
                                        .to_string(),
                                )
                            })?;
                        let sku = item
                            .sku
                            .clone()
                            .or_else(|| referenced.as_ref().and_then(|p| p.sku.clone()));
                        let unit_price = item
                            .unit_price
                            .or_else(|| referenced.as_ref().map(|p| p.price))
                            .unwrap_or(Decimal::ZERO);
                        let discount = item.discount.unwrap_or(Decimal::ZERO);
                        let subtotal = unit_price * Decimal::from(item.quantity) - discount;
                        computed_total += subtotal;

                        item_models.push(order_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            order_id: Set(order_id),
                            product_id: Set(item.product_id),
                            product_name: Set(product_name),
                            sku: Set(sku),
                            quantity: Set(item.quantity),
                            unit_price: Set(unit_price),
                            discount: Set(discount),
                            subtotal: Set(subtotal),
                            created_at: Set(now),
                            updated_at: Set(None),
                        });

                        if let Some(product) = referenced {
                            decrements.push((product, item.quantity));
                        }
                    }

                    let total_amount = supplied_total.unwrap_or(computed_total);

                    let saved_order = order::ActiveModel {
                        id: Set(order_id),
                        order_number: Set(order_number),
                        customer_id: Set(customer_id),
                        lead_id: Set(lead_id),
                        status: Set(OrderStatus::New.to_string()),
                        payment_status: Set(PaymentStatus::Pending.to_string()),
                        total_amount: Set(total_amount),
                        currency: Set(currency),
                        brand: Set(brand),
                        shipping_address: Set(shipping_address),
                        notes: Set(notes),
                        order_date: Set(now),
                        created_at: Set(now),
                        updated_at: Set(None),
                    }
                    .insert(txn)
                    .await?;

                    let mut saved_items = Vec::with_capacity(item_models.len());
                    for item_model in item_models {
                        saved_items.push(item_model.insert(txn).await?);
                    }

                    // Conditional decrement keeps the write atomic: no
                    // read-then-write window, and stock never goes below zero.
                    let mut stock_changes = Vec::with_capacity(decrements.len());
                    for (product, quantity) in decrements {
                        let updated = product::Entity::update_many()
                            .col_expr(
                                product::Column::Stock,
                                Expr::col(product::Column::Stock).sub(quantity),
                            )
                            .col_expr(product::Column::UpdatedAt, Expr::value(now))
                            .filter(product::Column::Id.eq(product.id))
                            .filter(product::Column::Stock.gte(quantity))
                            .exec(txn)
                            .await?;

                        let new_stock = if updated.rows_affected > 0 {
                            product.stock - quantity
                        } else {
                            product::Entity::update_many()
                                .col_expr(product::Column::Stock, Expr::value(0))
                                .col_expr(product::Column::UpdatedAt, Expr::value(now))
                                .filter(product::Column::Id.eq(product.id))
                                .exec(txn)
                                .await?;
                            0
                        };

                        stock_changes.push(StockChange {
                            product_id: product.id,
                            previous_stock: product.stock,
                            new_stock,
                        });
                    }

                    Ok((saved_order, saved_items, stock_changes))
                })
            },
        )
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(service_err) => service_err,
        })
    }
}

/// `ORD-` + 5 random uppercase base-36 chars + the last 6 digits of epoch millis.
fn generate_order_number() -> String {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let token: String = (0..5)
        .map(|_| {
            let digit = rng.gen_range(0..36u32);
            char::from_digit(digit, 36)
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or('0')
        })
        .collect();
    let millis = Utc::now().timestamp_millis().rem_euclid(1_000_000);
    format!("ORD-{}{:06}", token, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_follow_the_expected_shape() {
        let number = generate_order_number();
        assert!(number.starts_with("ORD-"));
        assert_eq!(number.len(), 4 + 5 + 6);
        let suffix = &number[4..];
        assert!(suffix[..5]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert!(suffix[5..].chars().all(|c| c.is_ascii_digit()));
    }
}
