//! 内存收银台网关（用于开发与测试）

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use manikura_errors::{AppError, AppResult};
use tracing::info;
use uuid::Uuid;

use crate::{CheckoutGateway, CheckoutSession, CreateCheckoutSession, CustomerDetails, Refund};

#[derive(Default)]
struct MockState {
    sessions: HashMap<String, CheckoutSession>,
    refunds: HashMap<String, Vec<Refund>>,
    /// payment_intent -> 金额（分）
    amounts: HashMap<String, i64>,
}

/// 内存收银台网关
///
/// 会话保存在进程内，`mark_paid` 模拟买家完成支付
#[derive(Default)]
pub struct MockCheckoutGateway {
    state: Mutex<MockState>,
}

impl MockCheckoutGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将会话标记为已支付，返回生成的 payment intent id
    pub fn mark_paid(&self, session_id: &str) -> Option<String> {
        let mut state = self.state.lock().unwrap();

        let payment_intent = format!("pi_mock_{}", Uuid::new_v4().simple());

        let amount = {
            let session = state.sessions.get_mut(session_id)?;
            session.payment_status = "paid".to_string();
            session.payment_intent = Some(payment_intent.clone());
            session.amount_total.unwrap_or(0)
        };

        state.amounts.insert(payment_intent.clone(), amount);
        Some(payment_intent)
    }

    /// 读取会话快照（测试断言用）
    pub fn session(&self, session_id: &str) -> Option<CheckoutSession> {
        self.state.lock().unwrap().sessions.get(session_id).cloned()
    }
}

#[async_trait::async_trait]
impl CheckoutGateway for MockCheckoutGateway {
    async fn create_checkout_session(
        &self,
        request: &CreateCheckoutSession,
    ) -> AppResult<CheckoutSession> {
        let id = format!("cs_mock_{}", Uuid::new_v4().simple());

        let session = CheckoutSession {
            id: id.clone(),
            url: Some(format!("https://checkout.stripe.test/c/pay/{}", id)),
            payment_status: "unpaid".to_string(),
            payment_intent: None,
            amount_total: Some(request.amount_cents),
            customer_details: Some(CustomerDetails {
                email: Some(request.customer_email.clone()),
                name: None,
            }),
            metadata: request.metadata.clone(),
        };

        info!(session_id = %id, "Mock checkout session created");

        self.state
            .lock()
            .unwrap()
            .sessions
            .insert(id, session.clone());

        Ok(session)
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::external_service(format!("No such session: {}", session_id)))
    }

    async fn create_refund(&self, payment_intent_id: &str, reason: &str) -> AppResult<Refund> {
        let mut state = self.state.lock().unwrap();

        let amount = *state.amounts.get(payment_intent_id).ok_or_else(|| {
            AppError::external_service(format!("No such payment_intent: {}", payment_intent_id))
        })?;

        let refund = Refund {
            id: format!("re_mock_{}", Uuid::new_v4().simple()),
            status: "succeeded".to_string(),
            amount,
            reason: Some(reason.to_string()),
            created: Utc::now().timestamp(),
        };

        state
            .refunds
            .entry(payment_intent_id.to_string())
            .or_default()
            .push(refund.clone());

        info!(refund_id = %refund.id, payment_intent = %payment_intent_id, "Mock refund created");
        Ok(refund)
    }

    async fn list_refunds(&self, payment_intent_id: &str) -> AppResult<Vec<Refund>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .refunds
            .get(payment_intent_id)
            .cloned()
            .unwrap_or_default())
    }
}
