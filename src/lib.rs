//! CRM API Library
//!
//! Backend for a small-business CRM: lead intake, lead/customer conversion,
//! order and inventory management, activity tracking, and an in-process event
//! pipeline decoupling side effects from the CRUD handlers.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod migrator;
pub mod models;
pub mod names;
pub mod openapi;
pub mod services;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Optional status filter, validated against the matching enum.
    pub status: Option<String>,
}

pub(crate) fn default_page() -> u64 {
    1
}
pub(crate) fn default_limit() -> u64 {
    20
}

// Common response wrapper for list endpoints
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        let limit = query.limit.max(1);
        Self {
            items,
            total,
            page: query.page.max(1),
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Builds the application router: status + metrics + the full /api surface.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "crm-api up" }))
        .route("/metrics", get(metrics_endpoint))
        .route("/openapi.json", get(openapi_json))
        .merge(handlers::health::router())
        .nest("/api/leads", handlers::leads::router())
        .nest("/api/customers", handlers::customers::router())
        .nest("/api/orders", handlers::orders::router())
        .nest("/api/products", handlers::inventory::product_routes())
        .nest(
            "/api/product-categories",
            handlers::inventory::category_routes(),
        )
        .nest("/api/activities", handlers::activities::activity_routes())
        .nest(
            "/api/interactions",
            handlers::activities::interaction_routes(),
        )
        .nest(
            "/api/opportunities",
            handlers::activities::opportunity_routes(),
        )
        .with_state(state)
}

async fn metrics_endpoint() -> impl IntoResponse {
    match metrics::render() {
        Ok(body) => (StatusCode::OK, body),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("metrics error"),
        ),
    }
}

async fn openapi_json() -> impl IntoResponse {
    Json(openapi::ApiDoc::openapi())
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn pagination_math_rounds_up() {
        let query = ListQuery {
            page: 2,
            limit: 20,
            status: None,
        };
        let response = PaginatedResponse::new(vec![1, 2, 3], 41, &query);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.page, 2);
    }

    #[test]
    fn zero_limit_is_clamped() {
        let query = ListQuery {
            page: 0,
            limit: 0,
            status: None,
        };
        let response = PaginatedResponse::new(Vec::<u8>::new(), 0, &query);
        assert_eq!(response.limit, 1);
        assert_eq!(response.page, 1);
        assert_eq!(response.total_pages, 0);
    }
}
