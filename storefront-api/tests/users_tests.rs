/// Integration tests for user and role administration
///
/// Require a PostgreSQL database reachable through `DATABASE_URL`.

mod common;

use axum::http::{header, StatusCode};
use common::{body_json, TestContext, TEST_PASSWORD};
use serde_json::json;
use storefront_shared::models::{role::Role, user::User};
use uuid::Uuid;

#[tokio::test]
async fn test_user_can_view_and_update_self_only() {
    let ctx = TestContext::new().await.unwrap();
    let me = ctx.create_user(&["User"]).await.unwrap();
    let someone = ctx.create_user(&["User"]).await.unwrap();
    let token = ctx.token_for(&me, &["User"]);

    let response = ctx
        .send("GET", &format!("/api/users/{}", me.id), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], me.email.as_str());

    let response = ctx
        .send("GET", &format!("/api/users/{}", someone.id), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .send(
            "PUT",
            &format!("/api/users/{}", me.id),
            Some(&token),
            Some(json!({ "first_name": "Renamed" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = User::find_by_id(&ctx.db, me.id).await.unwrap().unwrap();
    assert_eq!(stored.first_name.as_deref(), Some("Renamed"));

    let response = ctx.send("GET", "/api/users", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_and_deletes_user() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(&["Admin"]).await.unwrap();
    let token = ctx.token_for(&admin, &["Admin"]);
    let email = TestContext::unique_email("managed");

    let response = ctx
        .send(
            "POST",
            "/api/users",
            Some(&token),
            Some(json!({ "email": email, "password": TEST_PASSWORD, "roles": ["Admin", "User"] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    let created = body_json(response).await;
    assert_eq!(created["roles"], json!(["Admin", "User"]));

    let response = ctx.send("DELETE", &location, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx.send("GET", &location, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx.send("DELETE", &location, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_create_user_with_unknown_role_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(&["Admin"]).await.unwrap();
    let token = ctx.token_for(&admin, &["Admin"]);

    let response = ctx
        .send(
            "POST",
            "/api/users",
            Some(&token),
            Some(json!({
                "email": TestContext::unique_email("badrole"),
                "password": TEST_PASSWORD,
                "roles": [format!("NoSuchRole-{}", Uuid::new_v4())]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"][0]["field"], "roles");
}

#[tokio::test]
async fn test_assign_role() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(&["Admin"]).await.unwrap();
    let shopper = ctx.create_user(&["User"]).await.unwrap();
    let token = ctx.token_for(&admin, &["Admin"]);

    let response = ctx
        .send(
            "POST",
            "/api/users/assign-role",
            Some(&token),
            Some(json!({ "email": shopper.email, "role": "Admin" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["roles"], json!(["Admin", "User"]));

    // Assigning again changes nothing
    let response = ctx
        .send(
            "POST",
            "/api/users/assign-role",
            Some(&token),
            Some(json!({ "email": shopper.email, "role": "Admin" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        Role::names_for_user(&ctx.db, shopper.id).await.unwrap(),
        vec!["Admin".to_string(), "User".to_string()]
    );

    let response = ctx
        .send(
            "POST",
            "/api/users/assign-role",
            Some(&token),
            Some(json!({ "email": TestContext::unique_email("ghost"), "role": "Admin" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .send(
            "POST",
            "/api/users/assign-role",
            Some(&token),
            Some(json!({ "email": shopper.email, "role": format!("Missing-{}", Uuid::new_v4()) })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_replace_roles() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.create_user(&["Admin"]).await.unwrap();
    let target = ctx.create_user(&["User"]).await.unwrap();
    let token = ctx.token_for(&admin, &["Admin"]);
    let uri = format!("/api/users/{}/roles", target.id);

    let response = ctx
        .send("PUT", &uri, Some(&token), Some(json!({ "roles": ["Admin"] })))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        Role::names_for_user(&ctx.db, target.id).await.unwrap(),
        vec!["Admin".to_string()]
    );

    let response = ctx
        .send("PUT", &uri, Some(&token), Some(json!({ "roles": [] })))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(Role::names_for_user(&ctx.db, target.id).await.unwrap().is_empty());

    let response = ctx
        .send(
            "PUT",
            &format!("/api/users/{}/roles", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "roles": ["User"] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
