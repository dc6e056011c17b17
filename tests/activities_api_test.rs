mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;
use crm_api::events::Event;

#[tokio::test]
async fn activity_lifecycle_with_completion_event() {
    let app = TestApp::new().await;

    let (_, lead) = app
        .request_json(
            Method::POST,
            "/api/leads",
            Some(json!({"first_name": "Nina", "last_name": "Ruiz"})),
        )
        .await;
    let lead_id = lead["id"].as_str().expect("lead id").to_string();

    let (status, activity) = app
        .request_json(
            Method::POST,
            "/api/activities",
            Some(json!({
                "subject": "Follow-up call",
                "kind": "call",
                "lead_id": lead_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(activity["status"], "pending");
    let activity_id = activity["id"].as_str().expect("activity id").to_string();

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/activities",
            Some(json!({"subject": "Bad one", "kind": "carrier-pigeon"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    app.drain_events();

    let (status, completed) = app
        .request_json(
            Method::POST,
            &format!("/api/activities/{}/complete", activity_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert!(app
        .drain_events()
        .iter()
        .any(|e| matches!(e, Event::ActivityCompleted(_))));

    let (status, listed) = app
        .request_json(Method::GET, "/api/activities?status=completed", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn interactions_and_opportunities_are_recorded() {
    let app = TestApp::new().await;

    let (_, customer) = app
        .request_json(
            Method::POST,
            "/api/customers",
            Some(json!({"first_name": "Elena", "last_name": "Vega"})),
        )
        .await;
    let customer_id = customer["id"].as_str().expect("customer id").to_string();

    let (status, interaction) = app
        .request_json(
            Method::POST,
            "/api/interactions",
            Some(json!({
                "kind": "whatsapp",
                "summary": "Asked about the winter collection",
                "customer_id": customer_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(interaction["kind"], "whatsapp");

    let (status, opportunity) = app
        .request_json(
            Method::POST,
            "/api/opportunities",
            Some(json!({
                "title": "Bulk order for boutique",
                "amount": 1500.0,
                "customer_id": customer_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(opportunity["stage"], "open");
    let opportunity_id = opportunity["id"].as_str().expect("opportunity id").to_string();

    let (status, updated) = app
        .request_json(
            Method::PATCH,
            &format!("/api/opportunities/{}", opportunity_id),
            Some(json!({"stage": "won"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stage"], "won");

    let (status, listed) = app
        .request_json(Method::GET, "/api/interactions", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
}
