use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::commands::leads::CreateLeadCommand;
use crate::entities::{customer, lead};
use crate::services::leads::UpdateLeadRequest;
use crate::{errors::ServiceError, AppState, ListQuery, PaginatedResponse};

/// Response for the conversion endpoint: the terminally-updated lead plus the
/// customer it became (or already was, on an idempotent repeat).
#[derive(Debug, Serialize, ToSchema)]
pub struct ConvertLeadResponse {
    #[schema(value_type = Object)]
    pub lead: lead::Model,
    #[schema(value_type = Object)]
    pub customer: customer::Model,
    pub success: bool,
}

async fn create_lead(
    State(state): State<AppState>,
    Json(payload): Json<CreateLeadCommand>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.leads.create_lead(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (leads, total) = state
        .services
        .leads
        .list_leads(query.page, query.limit, query.status.clone())
        .await?;
    Ok(Json(PaginatedResponse::new(leads, total, &query)))
}

async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.leads.get_lead(id).await?;
    Ok(Json(found))
}

async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.leads.update_lead(id, payload).await?;
    Ok(Json(updated))
}

async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.leads.delete_lead(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Convert a lead into a customer
#[utoipa::path(
    post,
    path = "/api/leads/{id}/convert",
    params(
        ("id" = Uuid, Path, description = "Lead ID")
    ),
    responses(
        (status = 200, description = "Lead converted (idempotent on repeat)", body = ConvertLeadResponse),
        (status = 404, description = "Lead not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "leads"
)]
pub async fn convert_lead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.leads.convert_lead(id).await?;
    Ok(Json(ConvertLeadResponse {
        lead: result.lead,
        customer: result.customer,
        success: true,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_lead).get(list_leads))
        .route("/:id", get(get_lead).put(update_lead).delete(delete_lead))
        .route("/:id/convert", post(convert_lead))
}
