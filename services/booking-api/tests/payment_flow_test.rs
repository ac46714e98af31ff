//! 支付流程测试

mod support;

use booking_api::application::CheckoutRequest;
use booking_api::domain::reservation::{PaymentStatus, ReservationStatus};
use booking_api::domain::salon::PriceRange;
use chrono::Utc;
use manikura_errors::AppError;
use manikura_adapter_stripe::sign_payload;
use serde_json::json;
use support::{appointment_at, seed_salon, test_env, TEST_WEBHOOK_SECRET, TestEnv};

fn checkout_request(salon_id: i64) -> CheckoutRequest {
    CheckoutRequest {
        salon_id: Some(salon_id),
        service_type: Some("manucure".to_string()),
        appointment_date: Some(appointment_at(10)),
        price: Some(45.0),
        client_email: Some("cliente@example.com".to_string()),
        client_name: Some("Sophie".to_string()),
    }
}

/// 构造带合法签名的 completed 事件
fn completed_event(env: &TestEnv, session_id: &str) -> (Vec<u8>, String) {
    let session = env.gateway.session(session_id).expect("session should exist");

    let payload = json!({
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session.id,
                "url": session.url,
                "payment_status": session.payment_status,
                "payment_intent": session.payment_intent,
                "amount_total": session.amount_total,
                "customer_details": session.customer_details,
                "metadata": session.metadata,
            }
        }
    })
    .to_string()
    .into_bytes();

    let signature = sign_payload(&payload, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    (payload, signature)
}

#[tokio::test]
async fn test_create_checkout_missing_fields() {
    let env = test_env();

    let result = env
        .payment_service
        .create_checkout(CheckoutRequest {
            salon_id: Some(1),
            service_type: None,
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_create_checkout_unknown_salon() {
    let env = test_env();

    let result = env.payment_service.create_checkout(checkout_request(999)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_create_checkout_precreates_pending_reservation() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);

    let outcome = env
        .payment_service
        .create_checkout(checkout_request(salon.id))
        .await
        .unwrap();

    assert!(outcome.checkout_url.contains(&outcome.session_id));

    // 预约已创建并占住时段，支付状态 pending
    let all = env.reservations.all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, ReservationStatus::Confirmed);
    assert_eq!(all[0].payment_status, PaymentStatus::Pending);
    assert_eq!(all[0].checkout_session_id.as_deref(), Some(outcome.session_id.as_str()));

    // 会话元数据回链预约
    let session = env.gateway.session(&outcome.session_id).unwrap();
    assert_eq!(
        session.metadata.get("reservation_id").map(String::as_str),
        Some(all[0].id.to_string().as_str())
    );
    assert_eq!(session.amount_total, Some(4500));

    // 买家已按邮箱建档
    let client = env.auth.user_by_id(all[0].client_id).await.unwrap().unwrap();
    assert_eq!(client.email, "cliente@example.com");
    assert_eq!(client.name, "Sophie");
}

#[tokio::test]
async fn test_webhook_marks_pending_reservation_paid_exactly_once() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);

    let outcome = env
        .payment_service
        .create_checkout(checkout_request(salon.id))
        .await
        .unwrap();

    let payment_intent = env.gateway.mark_paid(&outcome.session_id).unwrap();
    let (payload, signature) = completed_event(&env, &outcome.session_id);

    env.payment_service
        .handle_webhook(&payload, Some(&signature))
        .await
        .unwrap();

    let all = env.reservations.all();
    assert_eq!(all.len(), 1, "webhook must not create a duplicate reservation");
    assert_eq!(all[0].payment_status, PaymentStatus::Paid);
    assert_eq!(all[0].stripe_payment_id.as_deref(), Some(payment_intent.as_str()));

    // 重复投递同一事件：无副作用
    env.payment_service
        .handle_webhook(&payload, Some(&signature))
        .await
        .unwrap();

    let after_redelivery = env.reservations.all();
    assert_eq!(after_redelivery.len(), 1);
    assert_eq!(after_redelivery[0].payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_webhook_creates_reservation_from_metadata_when_absent() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);

    // 没有预创建的预约，事件只携带元数据
    let payload = json!({
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_external_001",
                "payment_status": "paid",
                "payment_intent": "pi_external_001",
                "amount_total": 4500,
                "metadata": {
                    "salon_id": salon.id.to_string(),
                    "service_type": "manucure",
                    "appointment_date": appointment_at(15).to_rfc3339(),
                    "client_email": "inconnue@example.com",
                    "client_name": "Inconnue",
                }
            }
        }
    })
    .to_string()
    .into_bytes();
    let signature = sign_payload(&payload, TEST_WEBHOOK_SECRET, Utc::now().timestamp());

    env.payment_service
        .handle_webhook(&payload, Some(&signature))
        .await
        .unwrap();

    let all = env.reservations.all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, ReservationStatus::Confirmed);
    assert_eq!(all[0].payment_status, PaymentStatus::Paid);
    assert_eq!(all[0].salon_id, salon.id);
    assert_eq!(all[0].appointment_date, appointment_at(15));
    assert!((all[0].price - 45.0).abs() < f64::EPSILON);

    // 买家按回调元数据建档
    let client = env.auth.user_by_id(all[0].client_id).await.unwrap().unwrap();
    assert_eq!(client.email, "inconnue@example.com");
}

#[tokio::test]
async fn test_webhook_invalid_signature_rejected() {
    let env = test_env();
    seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);

    let payload = json!({"type": "checkout.session.completed", "data": {"object": {}}})
        .to_string()
        .into_bytes();
    let bad_signature = sign_payload(&payload, "whsec_wrong", Utc::now().timestamp());

    let result = env
        .payment_service
        .handle_webhook(&payload, Some(&bad_signature))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let missing = env.payment_service.handle_webhook(&payload, None).await;
    assert!(matches!(missing, Err(AppError::Validation(_))));

    // 状态未被触碰
    assert!(env.reservations.all().is_empty());
}

#[tokio::test]
async fn test_webhook_payment_failed_is_logged_only() {
    let env = test_env();

    let payload = json!({
        "type": "payment_intent.payment_failed",
        "data": {"object": {"id": "pi_failed_001"}}
    })
    .to_string()
    .into_bytes();
    let signature = sign_payload(&payload, TEST_WEBHOOK_SECRET, Utc::now().timestamp());

    env.payment_service
        .handle_webhook(&payload, Some(&signature))
        .await
        .unwrap();

    assert!(env.reservations.all().is_empty());
}

#[tokio::test]
async fn test_get_session_passthrough() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);

    let outcome = env
        .payment_service
        .create_checkout(checkout_request(salon.id))
        .await
        .unwrap();

    let status = env.payment_service.get_session(&outcome.session_id).await.unwrap();
    assert_eq!(status.payment_status, "unpaid");
    assert_eq!(
        status.metadata.get("service_type").map(String::as_str),
        Some("manucure")
    );

    let missing = env.payment_service.get_session("cs_missing").await;
    assert!(matches!(missing, Err(AppError::ExternalService(_))));
}

#[tokio::test]
async fn test_refund_flow() {
    let env = test_env();
    let salon = seed_salon(&env, "Ongles & Co", "Paris", 4.8, 30, PriceRange::Standard);

    let outcome = env
        .payment_service
        .create_checkout(checkout_request(salon.id))
        .await
        .unwrap();
    let payment_intent = env.gateway.mark_paid(&outcome.session_id).unwrap();
    let (payload, signature) = completed_event(&env, &outcome.session_id);
    env.payment_service
        .handle_webhook(&payload, Some(&signature))
        .await
        .unwrap();

    let refund = env
        .payment_service
        .refund(&payment_intent, "requested_by_customer")
        .await
        .unwrap();

    assert_eq!(refund.status, "succeeded");
    assert!((refund.amount - 45.0).abs() < f64::EPSILON);

    let reservation = &env.reservations.all()[0];
    assert_eq!(reservation.status, ReservationStatus::Cancelled);
    assert_eq!(reservation.payment_status, PaymentStatus::Refunded);

    let refunds = env.payment_service.list_refunds(&payment_intent).await.unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].id, refund.refund_id);
}

#[tokio::test]
async fn test_refund_unknown_payment_reference() {
    let env = test_env();

    let result = env.payment_service.refund("pi_missing", "fraud").await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
