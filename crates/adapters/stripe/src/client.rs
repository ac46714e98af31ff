//! Stripe REST 客户端实现

use manikura_config::StripeConfig;
use manikura_errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{CheckoutGateway, CheckoutSession, CreateCheckoutSession, Refund};

/// Stripe API 客户端
///
/// 通过 REST API 与服务商通信，请求体为表单编码
pub struct StripeClient {
    http: reqwest::Client,
    config: StripeConfig,
}

/// 服务商错误响应
#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// 退款列表响应
#[derive(Debug, Deserialize)]
struct RefundList {
    data: Vec<Refund>,
}

impl StripeClient {
    /// 创建新的 Stripe 客户端
    pub fn new(config: StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// 解析服务商响应，非 2xx 时提取错误消息
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::external_service(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorResponse>(&body)
                .ok()
                .and_then(|r| r.error.message.or(r.error.error_type))
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(AppError::external_service(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::external_service(format!("Unexpected response body: {}", e)))
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> AppResult<T> {
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Request failed: {}", e)))?;

        Self::parse_response(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> AppResult<T> {
        let response = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(self.config.secret_key.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Request failed: {}", e)))?;

        Self::parse_response(response).await
    }
}

#[async_trait::async_trait]
impl CheckoutGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CreateCheckoutSession,
    ) -> AppResult<CheckoutSession> {
        debug!(
            product = %request.product_name,
            amount_cents = request.amount_cents,
            "Creating checkout session"
        );

        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                request.product_description.clone(),
            ),
        ];

        if let Some(image_url) = &request.image_url {
            params.push((
                "line_items[0][price_data][product_data][images][0]".to_string(),
                image_url.clone(),
            ));
        }

        for (key, value) in &request.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        let session: CheckoutSession = self.post_form("checkout/sessions", &params).await?;

        info!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession> {
        debug!(session_id = %session_id, "Retrieving checkout session");

        self.get(&format!("checkout/sessions/{}", session_id), &[])
            .await
    }

    async fn create_refund(&self, payment_intent_id: &str, reason: &str) -> AppResult<Refund> {
        debug!(payment_intent = %payment_intent_id, reason = %reason, "Creating refund");

        let params = vec![
            ("payment_intent".to_string(), payment_intent_id.to_string()),
            ("reason".to_string(), reason.to_string()),
        ];

        let refund: Refund = self.post_form("refunds", &params).await?;

        info!(refund_id = %refund.id, payment_intent = %payment_intent_id, "Refund created");
        Ok(refund)
    }

    async fn list_refunds(&self, payment_intent_id: &str) -> AppResult<Vec<Refund>> {
        let query = vec![(
            "payment_intent".to_string(),
            payment_intent_id.to_string(),
        )];

        let list: RefundList = self.get("refunds", &query).await?;
        Ok(list.data)
    }
}
