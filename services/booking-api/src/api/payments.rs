//! 支付路由

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use manikura_errors::AppResult;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::state::AppState;
use crate::application::{CheckoutOutcome, CheckoutRequest, RefundItem, RefundOutcome, SessionStatus};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/session/{session_id}", get(get_checkout_session))
        .route("/webhook", post(webhook))
        .route("/refund", post(create_refund))
        .route("/refunds", get(list_refunds))
}

async fn create_checkout_session(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutOutcome>> {
    let outcome = state.payments.create_checkout(body).await?;
    Ok(Json(outcome))
}

async fn get_checkout_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionStatus>> {
    let status = state.payments.get_session(&session_id).await?;
    Ok(Json(status))
}

/// 服务商回调入口
///
/// 签名校验失败返回 400；处理失败返回 5xx 由服务商重试
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    state.payments.handle_webhook(&body, signature).await?;

    Ok(Json(json!({ "status": "success" })))
}

#[derive(Debug, Deserialize)]
pub struct RefundQuery {
    pub payment_intent_id: String,
    #[serde(default = "default_refund_reason")]
    pub reason: String,
}

fn default_refund_reason() -> String {
    "requested_by_customer".to_string()
}

async fn create_refund(
    State(state): State<AppState>,
    Query(query): Query<RefundQuery>,
) -> AppResult<Json<RefundOutcome>> {
    let outcome = state
        .payments
        .refund(&query.payment_intent_id, &query.reason)
        .await?;

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct RefundListQuery {
    pub payment_intent_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct RefundListResponse {
    pub refunds: Vec<RefundItem>,
}

async fn list_refunds(
    State(state): State<AppState>,
    Query(query): Query<RefundListQuery>,
) -> AppResult<Json<RefundListResponse>> {
    let refunds = state.payments.list_refunds(&query.payment_intent_id).await?;
    Ok(Json(RefundListResponse { refunds }))
}
