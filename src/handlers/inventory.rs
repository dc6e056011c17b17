use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::services::inventory::{
    AdjustStockRequest, CreateCategoryRequest, CreateProductRequest, UpdateCategoryRequest,
    UpdateProductRequest,
};
use crate::{errors::ServiceError, AppState, ListQuery, PaginatedResponse};

/// Filters for the product listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductFilters {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub category_id: Option<Uuid>,
    pub active: Option<bool>,
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.inventory.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List products with optional category/active filtering
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductFilters),
    responses(
        (status = 200, description = "Product list returned"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filters): Query<ProductFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (products, total) = state
        .services
        .inventory
        .list_products(
            filters.page,
            filters.limit,
            filters.category_id,
            filters.active,
        )
        .await?;
    let query = ListQuery {
        page: filters.page,
        limit: filters.limit,
        status: None,
    };
    Ok(Json(PaginatedResponse::new(products, total, &query)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.inventory.get_product(id).await?;
    Ok(Json(found))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.inventory.update_product(id, payload).await?;
    Ok(Json(updated))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.inventory.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.inventory.adjust_stock(id, payload).await?;
    Ok(Json(updated))
}

async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.inventory.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.inventory.list_categories().await?;
    Ok(Json(categories))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .inventory
        .update_category(id, payload)
        .await?;
    Ok(Json(updated))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.inventory.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/:id/adjust-stock", post(adjust_stock))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route("/:id", axum::routing::patch(update_category).delete(delete_category))
}
