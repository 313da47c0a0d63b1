/// Integration tests for orders
///
/// Require a PostgreSQL database reachable through `DATABASE_URL`.

mod common;

use axum::http::{header, StatusCode};
use common::{body_json, TestContext};
use rust_decimal::Decimal;
use serde_json::json;
use storefront_shared::models::{
    order::Order,
    product::{Product, ProductInput},
};
use uuid::Uuid;

async fn create_product(ctx: &TestContext, name: &str) -> Product {
    Product::create(
        &ctx.db,
        ProductInput {
            name: name.to_string(),
            description: None,
            price: Decimal::new(1999, 2),
            image_url: None,
            yield_rating: 5,
            specs: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_order_with_several_lines_persists_every_line() {
    let ctx = TestContext::new().await.unwrap();
    let shopper = ctx.create_user(&["User"]).await.unwrap();
    let token = ctx.token_for(&shopper, &["User"]);

    let a = create_product(&ctx, "Order Test A").await;
    let b = create_product(&ctx, "Order Test B").await;
    let c = create_product(&ctx, "Order Test C").await;

    let response = ctx
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({
                "items": [
                    { "product_id": a.id, "quantity": 1 },
                    { "product_id": b.id, "quantity": 2 },
                    { "product_id": c.id, "quantity": 3 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(header::LOCATION));

    let body = body_json(response).await;
    assert_eq!(body["user_id"], json!(shopper.id));

    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    let stored = Order::find_by_id(&ctx.db, id).await.unwrap().unwrap();
    assert_eq!(stored.items.len(), 3);
    let quantities: Vec<i32> = stored.items.iter().map(|i| i.quantity).collect();
    assert_eq!(quantities, vec![1, 2, 3]);

    // Any signed-in caller may read an order
    let response = ctx
        .send("GET", &format!("/api/orders/{}", id), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_shopper_cannot_order_for_someone_else() {
    let ctx = TestContext::new().await.unwrap();
    let shopper = ctx.create_user(&["User"]).await.unwrap();
    let other = ctx.create_user(&["User"]).await.unwrap();
    let token = ctx.token_for(&shopper, &["User"]);

    let response = ctx
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({ "user_id": other.id, "items": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_zero_quantity_and_unknown_product_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let shopper = ctx.create_user(&["User"]).await.unwrap();
    let token = ctx.token_for(&shopper, &["User"]);
    let product = create_product(&ctx, "Order Test Quantity").await;

    let response = ctx
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({ "items": [{ "product_id": product.id, "quantity": 0 }] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["details"][0]["field"],
        "items[0].quantity"
    );

    let response = ctx
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({ "items": [{ "product_id": Uuid::new_v4(), "quantity": 1 }] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mistyped_quantity_is_field_error() {
    let ctx = TestContext::new().await.unwrap();
    let shopper = ctx.create_user(&["User"]).await.unwrap();
    let token = ctx.token_for(&shopper, &["User"]);
    let product = create_product(&ctx, "Order Test Mistyped").await;

    let response = ctx
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({ "items": [{ "product_id": product.id, "quantity": "two" }] })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "items[0].quantity");
}

#[tokio::test]
async fn test_admin_replaces_and_deletes_order() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(&["Admin"]).await.unwrap();
    let shopper = ctx.create_user(&["User"]).await.unwrap();
    let token = ctx.token_for(&admin, &["Admin"]);
    let a = create_product(&ctx, "Order Test Replace A").await;
    let b = create_product(&ctx, "Order Test Replace B").await;

    let response = ctx
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(json!({
                "user_id": shopper.id,
                "items": [{ "product_id": a.id, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_str().unwrap().to_string();
    let uri = format!("/api/orders/{}", id);

    let response = ctx
        .send(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({
                "id": id,
                "user_id": shopper.id,
                "items": [
                    { "product_id": b.id, "quantity": 4 },
                    { "product_id": a.id, "quantity": 2 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = Order::find_by_id(&ctx.db, id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.items.len(), 2);
    assert_eq!(stored.items[0].product_id, b.id);

    // Filtered list only shows the shopper's orders
    let response = ctx
        .send(
            "GET",
            &format!("/api/orders?user_id={}", shopper.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let orders = body_json(response).await;
    assert!(orders
        .as_array()
        .unwrap()
        .iter()
        .all(|o| o["user_id"] == json!(shopper.id)));

    // A product on an order cannot be deleted
    let response = ctx
        .send("DELETE", &format!("/api/products/{}", b.id), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx.send("DELETE", &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!Order::exists(&ctx.db, id.parse().unwrap()).await.unwrap());
}

#[tokio::test]
async fn test_update_with_mismatched_id_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(&["Admin"]).await.unwrap();
    let token = ctx.token_for(&admin, &["Admin"]);

    let response = ctx
        .send(
            "PUT",
            &format!("/api/orders/{}", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "id": Uuid::new_v4(), "user_id": admin.id, "items": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_unknown_order_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(&["Admin"]).await.unwrap();
    let token = ctx.token_for(&admin, &["Admin"]);

    let response = ctx
        .send(
            "PUT",
            &format!("/api/orders/{}", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "user_id": admin.id, "items": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unknown_order_succeeds() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(&["Admin"]).await.unwrap();
    let token = ctx.token_for(&admin, &["Admin"]);

    let response = ctx
        .send(
            "DELETE",
            &format!("/api/orders/{}", Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
