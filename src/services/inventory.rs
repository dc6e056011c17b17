use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{order_item, product, product_category},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
    pub brand: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
    pub brand: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    /// Signed quantity; negative values consume stock.
    pub delta: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Service for managing products and product categories.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = self.db_pool.as_ref();

        if let Some(category_id) = request.category_id {
            self.get_category(category_id).await?;
        }

        let saved = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            sku: Set(request.sku),
            description: Set(request.description),
            category_id: Set(request.category_id),
            price: Set(request.price.unwrap_or(Decimal::ZERO)),
            stock: Set(request.stock.unwrap_or(0)),
            brand: Set(request.brand),
            active: Set(request.active.unwrap_or(true)),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(product_id = %saved.id, stock = saved.stock, "Product created");
        self.event_sender
            .send(Event::ProductCreated(saved.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with ID {} not found", product_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
        category_id: Option<Uuid>,
        active: Option<bool>,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = product::Entity::find().order_by_asc(product::Column::Name);
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(active) = active {
            query = query.filter(product::Column::Active.eq(active));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((products, total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = self.db_pool.as_ref();
        let existing = self.get_product(product_id).await?;
        let previous_stock = existing.stock;

        if let Some(category_id) = request.category_id {
            self.get_category(category_id).await?;
        }

        let mut update: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            update.name = Set(name);
        }
        if let Some(sku) = request.sku {
            update.sku = Set(Some(sku));
        }
        if let Some(description) = request.description {
            update.description = Set(Some(description));
        }
        if let Some(category_id) = request.category_id {
            update.category_id = Set(Some(category_id));
        }
        if let Some(price) = request.price {
            update.price = Set(price);
        }
        if let Some(stock) = request.stock {
            update.stock = Set(stock);
        }
        if let Some(brand) = request.brand {
            update.brand = Set(Some(brand));
        }
        if let Some(active) = request.active {
            update.active = Set(active);
        }
        update.updated_at = Set(Some(Utc::now()));

        let updated = update.update(db).await?;

        info!(product_id = %updated.id, "Product updated");
        if updated.stock != previous_stock {
            self.event_sender
                .send(Event::ProductStockChanged {
                    product_id: updated.id,
                    previous_stock,
                    new_stock: updated.stock,
                    reason: "product update".to_string(),
                })
                .await
                .map_err(ServiceError::EventError)?;
        }
        self.event_sender
            .send(Event::ProductUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Removes a product; order items that reference it keep their name and
    /// price snapshot with the reference nulled out.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_product(product_id).await?;

        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                order_item::Entity::update_many()
                    .col_expr(order_item::Column::ProductId, Expr::value(None::<Uuid>))
                    .filter(order_item::Column::ProductId.eq(existing.id))
                    .exec(txn)
                    .await?;
                existing.delete(txn).await?;
                Ok(())
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(service_err) => service_err,
        })?;

        info!(product_id = %product_id, "Product deleted");
        self.event_sender
            .send(Event::ProductDeleted(product_id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    /// Applies a signed stock adjustment, clamped at zero, without a
    /// read-then-write window on the decrement path.
    #[instrument(skip(self, request), fields(delta = request.delta))]
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        request: AdjustStockRequest,
    ) -> Result<product::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_product(product_id).await?;
        let now = Utc::now();

        if request.delta >= 0 {
            product::Entity::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).add(request.delta),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(now))
                .filter(product::Column::Id.eq(product_id))
                .exec(db)
                .await?;
        } else {
            let consumed = -request.delta;
            let updated = product::Entity::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(consumed),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(now))
                .filter(product::Column::Id.eq(product_id))
                .filter(product::Column::Stock.gte(consumed))
                .exec(db)
                .await?;
            if updated.rows_affected == 0 {
                product::Entity::update_many()
                    .col_expr(product::Column::Stock, Expr::value(0))
                    .col_expr(product::Column::UpdatedAt, Expr::value(now))
                    .filter(product::Column::Id.eq(product_id))
                    .exec(db)
                    .await?;
            }
        }

        let updated = self.get_product(product_id).await?;

        info!(
            product_id = %product_id,
            previous = existing.stock,
            new = updated.stock,
            "Stock adjusted"
        );
        self.event_sender
            .send(Event::ProductStockChanged {
                product_id,
                previous_stock: existing.stock,
                new_stock: updated.stock,
                reason: request
                    .reason
                    .unwrap_or_else(|| "manual adjustment".to_string()),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    #[instrument(skip(self, request))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<product_category::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let saved = product_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db_pool.as_ref())
        .await?;

        info!(category_id = %saved.id, "Product category created");
        self.event_sender
            .send(Event::CategoryCreated(saved.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_category(
        &self,
        category_id: Uuid,
    ) -> Result<product_category::Model, ServiceError> {
        product_category::Entity::find_by_id(category_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category with ID {} not found", category_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<product_category::Model>, ServiceError> {
        let categories = product_category::Entity::find()
            .order_by_asc(product_category::Column::Name)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(categories)
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<product_category::Model, ServiceError> {
        let existing = self.get_category(category_id).await?;

        let mut update: product_category::ActiveModel = existing.into();
        if let Some(name) = request.name {
            update.name = Set(name);
        }
        if let Some(description) = request.description {
            update.description = Set(Some(description));
        }
        update.updated_at = Set(Some(Utc::now()));

        Ok(update.update(self.db_pool.as_ref()).await?)
    }

    /// Removes a category; products that referenced it fall back to
    /// uncategorized.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_category(category_id).await?;

        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                product::Entity::update_many()
                    .col_expr(product::Column::CategoryId, Expr::value(None::<Uuid>))
                    .filter(product::Column::CategoryId.eq(existing.id))
                    .exec(txn)
                    .await?;
                existing.delete(txn).await?;
                Ok(())
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(service_err) => service_err,
        })?;

        info!(category_id = %category_id, "Product category deleted");
        self.event_sender
            .send(Event::CategoryDeleted(category_id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }
}
