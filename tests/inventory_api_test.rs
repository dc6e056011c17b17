mod common;

use axum::http::{Method, StatusCode};
use sea_orm::EntityTrait;
use serde_json::json;
use uuid::Uuid;

use common::TestApp;
use crm_api::{entities::order_item, events::Event};

#[tokio::test]
async fn product_crud_with_category_assignment() {
    let app = TestApp::new().await;

    let (status, category) = app
        .request_json(
            Method::POST,
            "/api/product-categories",
            Some(json!({"name": "Nightwear"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().expect("category id").to_string();

    let (status, product) = app
        .request_json(
            Method::POST,
            "/api/products",
            Some(json!({
                "name": "Satin pyjama",
                "sku": "SP-001",
                "category_id": category_id,
                "price": 59.9,
                "stock": 12
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_str().expect("product id").to_string();
    assert_eq!(product["active"], true);

    // Creating against an unknown category is caught before the insert.
    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/products",
            Some(json!({"name": "Orphan", "category_id": Uuid::new_v4()})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, listed) = app
        .request_json(
            Method::GET,
            &format!("/api/products?category_id={}", category_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["items"][0]["id"], product_id.as_str());

    let (status, updated) = app
        .request_json(
            Method::PATCH,
            &format!("/api/products/{}", product_id),
            Some(json!({"price": 64.9, "active": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["active"], false);

    let (status, listed) = app
        .request_json(Method::GET, "/api/products?active=true", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn stock_adjustments_clamp_at_zero_and_emit_events() {
    let app = TestApp::new().await;

    let (_, product) = app
        .request_json(
            Method::POST,
            "/api/products",
            Some(json!({"name": "Eye mask", "price": 9.9, "stock": 5})),
        )
        .await;
    let product_id = product["id"].as_str().expect("product id").to_string();
    app.drain_events();

    let (status, adjusted) = app
        .request_json(
            Method::POST,
            &format!("/api/products/{}/adjust-stock", product_id),
            Some(json!({"delta": -10, "reason": "stocktake correction"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(adjusted["stock"], 0);

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::ProductStockChanged {
            previous_stock: 5,
            new_stock: 0,
            ..
        }
    )));

    let (_, adjusted) = app
        .request_json(
            Method::POST,
            &format!("/api/products/{}/adjust-stock", product_id),
            Some(json!({"delta": 4})),
        )
        .await;
    assert_eq!(adjusted["stock"], 4);
}

#[tokio::test]
async fn deleting_a_product_keeps_order_item_snapshots() {
    let app = TestApp::new().await;

    let (_, customer) = app
        .request_json(
            Method::POST,
            "/api/customers",
            Some(json!({"first_name": "Rosa", "last_name": "Diaz"})),
        )
        .await;
    let customer_id = customer["id"].as_str().expect("customer id").to_string();

    let (_, product) = app
        .request_json(
            Method::POST,
            "/api/products",
            Some(json!({"name": "Winter robe", "price": 80.0, "stock": 3})),
        )
        .await;
    let product_id = product["id"].as_str().expect("product id").to_string();

    let (_, order) = app
        .request_json(
            Method::POST,
            "/api/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{"product_id": product_id, "quantity": 1}]
            })),
        )
        .await;
    let item_id = Uuid::parse_str(order["items"][0]["id"].as_str().expect("item id"))
        .expect("item id is a uuid");

    let (status, _) = app
        .request_json(Method::DELETE, &format!("/api/products/{}", product_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The line item survives with its snapshot, reference nulled out.
    let item = order_item::Entity::find_by_id(item_id)
        .one(app.state.db.as_ref())
        .await
        .expect("query order item")
        .expect("order item still exists");
    assert_eq!(item.product_name, "Winter robe");
    assert!(item.product_id.is_none());
}

#[tokio::test]
async fn category_deletion_uncategorizes_products() {
    let app = TestApp::new().await;

    let (_, category) = app
        .request_json(
            Method::POST,
            "/api/product-categories",
            Some(json!({"name": "Seasonal"})),
        )
        .await;
    let category_id = category["id"].as_str().expect("category id").to_string();

    let (_, product) = app
        .request_json(
            Method::POST,
            "/api/products",
            Some(json!({"name": "Summer set", "category_id": category_id})),
        )
        .await;
    let product_id = product["id"].as_str().expect("product id").to_string();

    let (status, _) = app
        .request_json(
            Method::DELETE,
            &format!("/api/product-categories/{}", category_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, product) = app
        .request_json(Method::GET, &format!("/api/products/{}", product_id), None)
        .await;
    assert!(product["category_id"].is_null());
}
