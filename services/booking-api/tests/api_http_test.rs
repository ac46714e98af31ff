//! HTTP 层测试（内存 Repository + oneshot 请求）

mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use booking_api::domain::salon::PriceRange;
use serde_json::{Value, json};
use support::{seed_salon, test_env, test_router};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_root_greeting() {
    let env = test_env();
    let app = test_router(&env);

    let response = app.oneshot(get_request("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Manikura"));
}

#[tokio::test]
async fn test_register_login_me_roundtrip() {
    let env = test_env();
    let app = test_router(&env);

    // 注册
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "email": "sophie@example.com",
                "name": "Sophie",
                "phone": "0123456789",
                "is_professional": false
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 重复注册 → 409 Problem Details
    let duplicate = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "email": "sophie@example.com",
                "name": "Sophie",
                "phone": "0123456789"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    let problem = body_json(duplicate).await;
    assert_eq!(problem["title"], "Conflict");

    // 登录
    let login = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({"email": "sophie@example.com", "password": "whatever"}),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let login_body = body_json(login).await;
    let token = login_body["access_token"].as_str().unwrap().to_string();
    assert_eq!(login_body["token_type"], "bearer");

    // /me 携带令牌
    let me = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let me_body = body_json(me).await;
    assert_eq!(me_body["email"], "sophie@example.com");

    // /me 无令牌 → 401
    let anonymous = app.oneshot(get_request("/api/auth/me")).await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_salon_listing_and_lookup() {
    let env = test_env();
    seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);
    seed_salon(&env, "Belle Manucure", "Lyon", 4.2, 10, PriceRange::Budget);
    let app = test_router(&env);

    let listing = app
        .clone()
        .oneshot(get_request("/api/salons/?city=paris"))
        .await
        .unwrap();
    assert_eq!(listing.status(), StatusCode::OK);
    let body = body_json(listing).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Ongles & Co");
    assert_eq!(body[0]["price_range"], "€€");

    let missing = app.oneshot(get_request("/api/salons/999")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reservation_create_and_cancel_over_http() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);
    let app = test_router(&env);

    // 未认证创建：使用 MVP 默认客户
    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reservations/",
            json!({
                "salon_id": salon.id,
                "service_type": "manucure",
                "appointment_date": "2026-02-14T10:00:00Z",
                "price": 45.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let body = body_json(created).await;
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["client_id"], 1);
    assert_eq!(body["duration_minutes"], 60);
    let id = body["id"].as_i64().unwrap();

    // 同时段再订 → 409
    let conflict = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reservations/",
            json!({
                "salon_id": salon.id,
                "service_type": "pose",
                "appointment_date": "2026-02-14T10:30:00Z",
                "price": 60.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(conflict.status(), StatusCode::CONFLICT);

    // 取消
    let cancelled = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/reservations/{}/cancel", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status(), StatusCode::OK);
    let message = body_json(cancelled).await;
    assert!(message["message"].as_str().unwrap().contains("annulée"));

    // 取消不存在的预约 → 404
    let missing = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/reservations/999/cancel")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_rejects_unsigned_payload() {
    let env = test_env();
    let app = test_router(&env);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/payments/webhook",
            json!({"type": "checkout.session.completed", "data": {"object": {}}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_availability_endpoint() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);
    let app = test_router(&env);

    let response = app
        .oneshot(get_request(&format!(
            "/api/salons/{}/availability?date=2026-02-14",
            salon.id
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 10);
    assert_eq!(body["slots"][0]["time"], "09:00");
    assert_eq!(body["slots"][0]["available"], true);
}
