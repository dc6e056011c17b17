mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use uuid::Uuid;

use common::TestApp;
use crm_api::{entities::customer, events::Event};

#[tokio::test]
async fn converting_a_lead_copies_contact_fields_and_is_idempotent() {
    let app = TestApp::new().await;

    let (status, lead) = app
        .request_json(
            Method::POST,
            "/api/leads",
            Some(json!({
                "name": "John Doe",
                "email": "j@x.com",
                "source": "landing-page"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let lead_id = lead["id"].as_str().expect("lead id").to_string();
    assert_eq!(lead["name"], "John Doe");
    assert_eq!(lead["status"], "new");
    app.drain_events();

    // First conversion splits the legacy display name into parts.
    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/leads/{}/convert", lead_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["customer"]["first_name"], "John");
    assert_eq!(body["customer"]["last_name"], "Doe");
    assert_eq!(body["customer"]["email"], "j@x.com");
    assert_eq!(body["lead"]["converted_to_customer"], true);
    assert_eq!(body["lead"]["status"], "converted");
    let customer_id = body["customer"]["id"].as_str().expect("customer id").to_string();
    assert_eq!(body["lead"]["converted_customer_id"], customer_id.as_str());

    let events = app.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::LeadConverted { .. })));

    // Second conversion returns the same pair and creates no second customer.
    let (status, repeat) = app
        .request_json(
            Method::POST,
            &format!("/api/leads/{}/convert", lead_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(repeat["customer"]["id"], customer_id.as_str());
    assert_eq!(repeat["lead"]["id"], lead_id.as_str());

    let events = app.drain_events();
    assert!(
        !events.iter().any(|e| matches!(e, Event::LeadConverted { .. })),
        "idempotent repeat must not emit a second conversion event"
    );

    let customer_count = customer::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .expect("count customers");
    assert_eq!(customer_count, 1);
}

#[tokio::test]
async fn converting_a_missing_lead_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/leads/{}/convert", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn conversion_markers_survive_later_updates() {
    let app = TestApp::new().await;

    let (_, lead) = app
        .request_json(
            Method::POST,
            "/api/leads",
            Some(json!({"first_name": "Juan", "last_name": "Pérez"})),
        )
        .await;
    let lead_id = lead["id"].as_str().expect("lead id").to_string();
    assert_eq!(lead["name"], "Juan Pérez");

    let (_, converted) = app
        .request_json(
            Method::POST,
            &format!("/api/leads/{}/convert", lead_id),
            None,
        )
        .await;
    let customer_id = converted["customer"]["id"].as_str().expect("id").to_string();

    // An ordinary update cannot touch the conversion markers.
    let (status, updated) = app
        .request_json(
            Method::PUT,
            &format!("/api/leads/{}", lead_id),
            Some(json!({"status": "contacted", "notes": "reached out again"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["converted_to_customer"], true);
    assert_eq!(updated["converted_customer_id"], customer_id.as_str());
}

#[tokio::test]
async fn lead_status_filter_rejects_unknown_values() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request_json(Method::GET, "/api/leads?status=bogus", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request_json(Method::GET, "/api/leads?status=new", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}
