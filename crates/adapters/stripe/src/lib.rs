//! Stripe 适配器
//!
//! 托管收银台（Checkout）集成，支持：
//! - 创建/查询 Checkout Session
//! - 退款创建与查询
//! - Webhook 签名验证

mod client;
mod mock;
mod webhook;

pub use client::StripeClient;
pub use mock::MockCheckoutGateway;
pub use webhook::{
    DEFAULT_TOLERANCE_SECS, WebhookEvent, parse_event, sign_payload, verify_signature,
};

use std::collections::HashMap;

use manikura_errors::AppResult;
use serde::{Deserialize, Serialize};

/// 创建 Checkout Session 的请求
#[derive(Debug, Clone)]
pub struct CreateCheckoutSession {
    pub product_name: String,
    pub product_description: String,
    pub image_url: Option<String>,
    /// 金额（分）
    pub amount_cents: i64,
    pub currency: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    /// 预订明细作为不透明元数据随会话保存，回调时取回
    pub metadata: HashMap<String, String>,
}

/// Checkout Session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// 托管收银台跳转地址
    pub url: Option<String>,
    pub payment_status: String,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// 买家信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// 退款
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
    /// 金额（分）
    pub amount: i64,
    pub reason: Option<String>,
    pub created: i64,
}

/// 收银台网关接口
///
/// 对托管支付服务商的抽象，便于在测试中替换为内存实现
#[async_trait::async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// 创建 Checkout Session
    async fn create_checkout_session(
        &self,
        request: &CreateCheckoutSession,
    ) -> AppResult<CheckoutSession>;

    /// 查询 Checkout Session
    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession>;

    /// 创建退款（全额）
    async fn create_refund(&self, payment_intent_id: &str, reason: &str) -> AppResult<Refund>;

    /// 查询某笔支付的退款列表
    async fn list_refunds(&self, payment_intent_id: &str) -> AppResult<Vec<Refund>>;
}
