mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;
use crm_api::events::Event;

#[tokio::test]
async fn customer_round_trips_back_to_a_fresh_lead() {
    let app = TestApp::new().await;

    let (status, created) = app
        .request_json(
            Method::POST,
            "/api/customers",
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "brand": "sleepwear"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let customer_id = created["id"].as_str().expect("customer id").to_string();
    app.drain_events();

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/customers/{}/convert-to-lead", customer_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["lead"]["first_name"], "Ada");
    assert_eq!(body["lead"]["last_name"], "Lovelace");
    assert_eq!(body["lead"]["status"], "new");
    assert_eq!(body["lead"]["converted_to_customer"], false);

    // The customer row is gone.
    let (status, _) = app
        .request_json(Method::GET, &format!("/api/customers/{}", customer_id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deletion is announced before the replacement lead.
    let events = app.drain_events();
    let deleted_at = events
        .iter()
        .position(|e| matches!(e, Event::CustomerDeleted(_)))
        .expect("CustomerDeleted event");
    let created_at = events
        .iter()
        .position(|e| matches!(e, Event::LeadCreated(_)))
        .expect("LeadCreated event");
    assert!(deleted_at < created_at);
}

#[tokio::test]
async fn customers_with_orders_can_neither_be_deleted_nor_converted() {
    let app = TestApp::new().await;

    let (_, created) = app
        .request_json(
            Method::POST,
            "/api/customers",
            Some(json!({"first_name": "Grace", "last_name": "Hopper"})),
        )
        .await;
    let customer_id = created["id"].as_str().expect("customer id").to_string();

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{"product_name": "Pyjama set", "quantity": 1, "unit_price": 49.5}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request_json(
            Method::DELETE,
            &format!("/api/customers/{}", customer_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (status, _) = app
        .request_json(
            Method::POST,
            &format!("/api/customers/{}/convert-to-lead", customer_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Still on the books.
    let (status, _) = app
        .request_json(Method::GET, &format!("/api/customers/{}", customer_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn nameless_customer_converts_as_unknown() {
    let app = TestApp::new().await;

    let (_, created) = app
        .request_json(
            Method::POST,
            "/api/customers",
            Some(json!({"email": "mystery@example.com"})),
        )
        .await;
    let customer_id = created["id"].as_str().expect("customer id").to_string();

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/customers/{}/convert-to-lead", customer_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lead"]["first_name"], "Unknown");
    assert_eq!(body["lead"]["email"], "mystery@example.com");
}
