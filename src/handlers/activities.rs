use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::services::activities::{
    CreateActivityRequest, CreateInteractionRequest, CreateOpportunityRequest,
    UpdateActivityRequest, UpdateOpportunityRequest,
};
use crate::{errors::ServiceError, AppState, ListQuery, PaginatedResponse};

async fn create_activity(
    State(state): State<AppState>,
    Json(payload): Json<CreateActivityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.activities.create_activity(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (activities, total) = state
        .services
        .activities
        .list_activities(query.page, query.limit, query.status.clone())
        .await?;
    Ok(Json(PaginatedResponse::new(activities, total, &query)))
}

async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.activities.get_activity(id).await?;
    Ok(Json(found))
}

async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateActivityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .activities
        .update_activity(id, payload)
        .await?;
    Ok(Json(updated))
}

async fn complete_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let completed = state.services.activities.complete_activity(id).await?;
    Ok(Json(completed))
}

async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.activities.delete_activity(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_interaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateInteractionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .activities
        .create_interaction(payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_interactions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (interactions, total) = state
        .services
        .activities
        .list_interactions(query.page, query.limit)
        .await?;
    Ok(Json(PaginatedResponse::new(interactions, total, &query)))
}

async fn delete_interaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.activities.delete_interaction(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_opportunity(
    State(state): State<AppState>,
    Json(payload): Json<CreateOpportunityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .activities
        .create_opportunity(payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_opportunities(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (opportunities, total) = state
        .services
        .activities
        .list_opportunities(query.page, query.limit)
        .await?;
    Ok(Json(PaginatedResponse::new(opportunities, total, &query)))
}

async fn get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.activities.get_opportunity(id).await?;
    Ok(Json(found))
}

async fn update_opportunity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOpportunityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .activities
        .update_opportunity(id, payload)
        .await?;
    Ok(Json(updated))
}

async fn delete_opportunity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.activities.delete_opportunity(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_activity).get(list_activities))
        .route(
            "/:id",
            get(get_activity)
                .patch(update_activity)
                .delete(delete_activity),
        )
        .route("/:id/complete", post(complete_activity))
}

pub fn interaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_interaction).get(list_interactions))
        .route("/:id", axum::routing::delete(delete_interaction))
}

pub fn opportunity_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_opportunity).get(list_opportunities))
        .route(
            "/:id",
            get(get_opportunity)
                .patch(update_opportunity)
                .delete(delete_opportunity),
        )
}
