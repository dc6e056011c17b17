mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;
use crm_api::{entities::order_item, events::Event};

async fn seed_customer(app: &TestApp) -> String {
    let (status, created) = app
        .request_json(
            Method::POST,
            "/api/customers",
            Some(json!({"first_name": "Maria", "last_name": "Gomez"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    created["id"].as_str().expect("customer id").to_string()
}

async fn seed_product(app: &TestApp, name: &str, price: f64, stock: i32) -> String {
    let (status, created) = app
        .request_json(
            Method::POST,
            "/api/products",
            Some(json!({"name": name, "price": price, "stock": stock})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    created["id"].as_str().expect("product id").to_string()
}

#[tokio::test]
async fn order_creation_decrements_stock_and_emits_one_stock_event() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app).await;
    let product_id = seed_product(&app, "Night shirt", 25.0, 10).await;
    app.drain_events();

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{"product_id": product_id, "quantity": 3}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["status"], "new");
    assert_eq!(body["order"]["payment_status"], "pending");
    assert!(body["order"]["order_number"]
        .as_str()
        .expect("order number")
        .starts_with("ORD-"));
    // Unit price snapshots from the product, 3 × 25.
    assert_eq!(body["order"]["total_amount"], "75");

    let (_, product) = app
        .request_json(Method::GET, &format!("/api/products/{}", product_id), None)
        .await;
    assert_eq!(product["stock"], 7);

    let events = app.drain_events();
    let stock_events: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e, Event::ProductStockChanged { .. }))
        .collect();
    assert_eq!(stock_events.len(), 1);
    match stock_events[0] {
        Event::ProductStockChanged {
            previous_stock,
            new_stock,
            ..
        } => {
            assert_eq!(*previous_stock, 10);
            assert_eq!(*new_stock, 7);
        }
        _ => unreachable!(),
    }
    assert!(events.iter().any(|e| matches!(e, Event::OrderCreated(_))));
}

#[tokio::test]
async fn ordering_more_than_stock_clamps_at_zero() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app).await;
    let product_id = seed_product(&app, "Slippers", 12.0, 2).await;
    app.drain_events();

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{"product_id": product_id, "quantity": 5}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, product) = app
        .request_json(Method::GET, &format!("/api/products/{}", product_id), None)
        .await;
    assert_eq!(product["stock"], 0);

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::ProductStockChanged {
            previous_stock: 2,
            new_stock: 0,
            ..
        }
    )));
}

#[tokio::test]
async fn bogus_status_update_is_rejected_without_mutation() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app).await;

    let (_, created) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({"customer_id": customer_id, "items": []})),
        )
        .await;
    let order_id = created["order"]["id"].as_str().expect("order id").to_string();
    app.drain_events();

    let (status, body) = app
        .request_json(
            Method::PATCH,
            &format!("/api/orders/{}/status", order_id),
            Some(json!({"status": "bogus"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    let (_, order) = app
        .request_json(Method::GET, &format!("/api/orders/{}", order_id), None)
        .await;
    assert_eq!(order["status"], "new");
    assert!(app.drain_events().is_empty());
}

#[tokio::test]
async fn status_change_appends_audit_trail_and_fires_event() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app).await;

    let (_, created) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({"customer_id": customer_id, "items": []})),
        )
        .await;
    let order_id = created["order"]["id"].as_str().expect("order id").to_string();
    app.drain_events();

    let (status, updated) = app
        .request_json(
            Method::PATCH,
            &format!("/api/orders/{}/status", order_id),
            Some(json!({"status": "preparing", "reason": "packed by warehouse"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "preparing");
    let notes = updated["notes"].as_str().expect("audit note");
    assert!(notes.contains("status: new -> preparing (packed by warehouse)"));

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::OrderStatusChanged { previous_status, new_status, .. }
            if previous_status == "new" && new_status == "preparing"
    )));

    // Payment status moves independently of fulfillment.
    let (status, updated) = app
        .request_json(
            Method::PATCH,
            &format!("/api/orders/{}/payment-status", order_id),
            Some(json!({"status": "paid"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["payment_status"], "paid");
    assert_eq!(updated["status"], "preparing");

    let events = app.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::PaymentStatusChanged { .. })));
}

#[tokio::test]
async fn converted_lead_places_an_order_end_to_end() {
    let app = TestApp::new().await;

    let (_, lead) = app
        .request_json(
            Method::POST,
            "/api/leads",
            Some(json!({"name": "John Doe", "email": "j@x.com"})),
        )
        .await;
    let lead_id = lead["id"].as_str().expect("lead id").to_string();

    let (_, converted) = app
        .request_json(
            Method::POST,
            &format!("/api/leads/{}/convert", lead_id),
            None,
        )
        .await;
    assert_eq!(converted["customer"]["first_name"], "John");
    assert_eq!(converted["customer"]["last_name"], "Doe");
    let customer_id = converted["customer"]["id"].as_str().expect("id").to_string();

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": customer_id,
                "lead_id": lead_id,
                "items": [{"product_name": "Silk robe", "quantity": 1, "unit_price": 99.99}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["total_amount"], "99.99");
    assert_eq!(body["order"]["lead_id"], lead_id.as_str());

    let order_id = Uuid::parse_str(body["order"]["id"].as_str().expect("order id"))
        .expect("order id is a uuid");
    let item_count = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .count(app.state.db.as_ref())
        .await
        .expect("count order items");
    assert_eq!(item_count, 1);
}

#[tokio::test]
async fn order_for_missing_customer_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": Uuid::new_v4(),
                "items": [{"product_name": "Anything", "quantity": 1, "unit_price": 1.0}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn deleting_an_order_removes_its_items() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app).await;

    let (_, created) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [
                    {"product_name": "Robe", "quantity": 1, "unit_price": 10.0},
                    {"product_name": "Slippers", "quantity": 2, "unit_price": 5.0}
                ]
            })),
        )
        .await;
    let order_id = created["order"]["id"].as_str().expect("order id").to_string();
    assert_eq!(created["items"].as_array().expect("items").len(), 2);

    let (status, _) = app
        .request_json(Method::DELETE, &format!("/api/orders/{}", order_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let order_uuid = Uuid::parse_str(&order_id).expect("uuid");
    let remaining = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_uuid))
        .count(app.state.db.as_ref())
        .await
        .expect("count order items");
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn omitted_total_sums_item_subtotals_with_discounts() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app).await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [
                    {"product_name": "Robe", "quantity": 2, "unit_price": 30.0, "discount": 5.0},
                    {"product_name": "Mask", "quantity": 1, "unit_price": 8.5}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // 2×30 − 5 + 8.5
    assert_eq!(body["order"]["total_amount"], "63.5");

    let supplied: Value = json!({
        "customer_id": customer_id,
        "total_amount": 100,
        "items": [{"product_name": "Robe", "quantity": 1, "unit_price": 30.0}]
    });
    let (_, body) = app.request_json(Method::POST, "/api/orders", Some(supplied)).await;
    assert_eq!(body["order"]["total_amount"], "100");
}
