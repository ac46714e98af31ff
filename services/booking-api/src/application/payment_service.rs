//! 支付服务
//!
//! 托管收银台流程：
//! 1. create_checkout 预创建待支付预约并生成收银台会话（会话 id 写回预约）
//! 2. 服务商回调 checkout.session.completed 时将该预约标记为已支付；
//!    找不到对应预约时，按回调元数据补建（兜底路径）
//! 回调处理失败向服务商返回 5xx，由其重试，不再静默吞错

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use manikura_adapter_stripe::{
    CheckoutGateway, CheckoutSession, CreateCheckoutSession, CustomerDetails,
    DEFAULT_TOLERANCE_SECS, parse_event, verify_signature,
};
use manikura_config::StripeConfig;
use manikura_errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::auth_service::AuthService;
use crate::application::notifier::Notifier;
use crate::domain::repositories::{ReservationRepository, SalonRepository};
use crate::domain::reservation::{
    DEFAULT_DURATION_MINUTES, NewReservation, PaymentStatus, Reservation, ReservationStatus,
};

/// 创建收银台会话的请求字段（缺失必填项返回 Validation 错误）
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CheckoutRequest {
    pub salon_id: Option<i64>,
    pub service_type: Option<String>,
    pub appointment_date: Option<DateTime<Utc>>,
    pub price: Option<f64>,
    pub client_email: Option<String>,
    pub client_name: Option<String>,
}

/// 收银台会话创建结果
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub checkout_url: String,
    pub session_id: String,
}

/// 会话状态查询结果
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub payment_status: String,
    pub customer_details: Option<CustomerDetails>,
    pub metadata: HashMap<String, String>,
}

/// 退款结果
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub refund_id: String,
    pub status: String,
    /// 金额（欧元）
    pub amount: f64,
}

/// 退款明细
#[derive(Debug, Clone, Serialize)]
pub struct RefundItem {
    pub id: String,
    /// 金额（欧元）
    pub amount: f64,
    pub status: String,
    pub reason: Option<String>,
    pub created: i64,
}

/// 支付服务
pub struct PaymentService {
    gateway: Arc<dyn CheckoutGateway>,
    reservations: Arc<dyn ReservationRepository>,
    salons: Arc<dyn SalonRepository>,
    auth: Arc<AuthService>,
    notifier: Notifier,
    config: StripeConfig,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn CheckoutGateway>,
        reservations: Arc<dyn ReservationRepository>,
        salons: Arc<dyn SalonRepository>,
        auth: Arc<AuthService>,
        notifier: Notifier,
        config: StripeConfig,
    ) -> Self {
        Self {
            gateway,
            reservations,
            salons,
            auth,
            notifier,
            config,
        }
    }

    /// 创建收银台会话
    ///
    /// 预创建一条待支付预约（排除约束即刻占住时段），
    /// 预订明细同时作为会话元数据保存
    pub async fn create_checkout(&self, request: CheckoutRequest) -> AppResult<CheckoutOutcome> {
        let (Some(salon_id), Some(service_type), Some(appointment_date), Some(price), Some(client_email)) = (
            request.salon_id,
            request.service_type,
            request.appointment_date,
            request.price,
            request.client_email,
        ) else {
            return Err(AppError::validation("Données de réservation incomplètes"));
        };
        let client_name = request.client_name.unwrap_or_default();

        let salon = self
            .salons
            .find_by_id(salon_id)
            .await?
            .ok_or_else(|| AppError::not_found("Salon non trouvé"))?;

        let client = self
            .auth
            .resolve_or_create(&client_email, &client_name)
            .await?;

        // 先占住时段，支付完成前 payment_status 保持 pending
        let reservation = self
            .reservations
            .create(&NewReservation {
                salon_id,
                client_id: client.id,
                service_type: service_type.clone(),
                appointment_date,
                duration_minutes: DEFAULT_DURATION_MINUTES,
                price,
                status: ReservationStatus::Confirmed,
                payment_status: PaymentStatus::Pending,
                checkout_session_id: None,
                stripe_payment_id: None,
                client_notes: None,
            })
            .await?;

        let metadata = HashMap::from([
            ("salon_id".to_string(), salon_id.to_string()),
            ("service_type".to_string(), service_type.clone()),
            (
                "appointment_date".to_string(),
                appointment_date.to_rfc3339(),
            ),
            ("client_email".to_string(), client.email.clone()),
            ("client_name".to_string(), client_name),
            ("reservation_id".to_string(), reservation.id.to_string()),
        ]);

        let session = self
            .gateway
            .create_checkout_session(&CreateCheckoutSession {
                product_name: format!("{} - {}", service_type, salon.name),
                product_description: format!("Réservation le {}", appointment_date.to_rfc3339()),
                image_url: salon.image_url.clone(),
                amount_cents: (price * 100.0).round() as i64,
                currency: "eur".to_string(),
                customer_email: client.email.clone(),
                success_url: format!(
                    "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
                    self.config.frontend_url
                ),
                cancel_url: format!("{}/payment-cancel", self.config.frontend_url),
                metadata,
            })
            .await?;

        self.reservations
            .set_checkout_session(reservation.id, &session.id)
            .await?;

        let checkout_url = session
            .url
            .clone()
            .ok_or_else(|| AppError::external_service("Session has no checkout URL"))?;

        info!(
            reservation_id = reservation.id,
            session_id = %session.id,
            "Checkout session created"
        );

        Ok(CheckoutOutcome {
            checkout_url,
            session_id: session.id,
        })
    }

    /// 查询会话状态（服务商透传）
    pub async fn get_session(&self, session_id: &str) -> AppResult<SessionStatus> {
        let session = self.gateway.retrieve_checkout_session(session_id).await?;

        Ok(SessionStatus {
            payment_status: session.payment_status,
            customer_details: session.customer_details,
            metadata: session.metadata,
        })
    }

    /// 处理服务商回调
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> AppResult<()> {
        let signature = signature.ok_or_else(|| AppError::validation("Signature manquante"))?;

        verify_signature(
            payload,
            signature,
            self.config.webhook_secret.expose_secret(),
            DEFAULT_TOLERANCE_SECS,
        )?;

        let event = parse_event(payload)?;

        match event.event_type.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSession = serde_json::from_value(event.object().clone())
                    .map_err(|e| {
                        AppError::validation(format!("Invalid session object: {}", e))
                    })?;
                self.handle_completed_session(session).await
            }
            "payment_intent.payment_failed" => {
                // 支付失败只记录，不做状态变更
                warn!(
                    payment_intent = %event.object()["id"].as_str().unwrap_or("unknown"),
                    "Payment failed"
                );
                Ok(())
            }
            other => {
                debug!(event_type = %other, "Ignoring webhook event");
                Ok(())
            }
        }
    }

    /// 支付完成：优先流转既有待支付预约，找不到时按元数据补建
    async fn handle_completed_session(&self, session: CheckoutSession) -> AppResult<()> {
        let payment_ref = session
            .payment_intent
            .clone()
            .unwrap_or_else(|| session.id.clone());

        if let Some(reservation) = self
            .reservations
            .find_by_checkout_session(&session.id)
            .await?
        {
            if reservation.payment_status == PaymentStatus::Paid {
                // 服务商可能重复投递同一事件
                info!(
                    reservation_id = reservation.id,
                    session_id = %session.id,
                    "Reservation already paid, ignoring duplicate event"
                );
                return Ok(());
            }

            self.reservations
                .mark_paid(reservation.id, &payment_ref)
                .await?;

            info!(
                reservation_id = reservation.id,
                session_id = %session.id,
                "Reservation marked as paid"
            );

            self.notify_confirmation(&reservation).await;
            return Ok(());
        }

        // 兜底：没有预创建记录，按元数据补建
        let client_email = session
            .metadata
            .get("client_email")
            .cloned()
            .ok_or_else(|| AppError::validation("Missing client_email in session metadata"))?;
        let client_name = session
            .metadata
            .get("client_name")
            .cloned()
            .unwrap_or_default();
        let salon_id: i64 = session
            .metadata
            .get("salon_id")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| AppError::validation("Missing salon_id in session metadata"))?;
        let appointment_date = session
            .metadata
            .get("appointment_date")
            .and_then(|v| parse_metadata_date(v))
            .ok_or_else(|| {
                AppError::validation("Missing appointment_date in session metadata")
            })?;
        let price = session.amount_total.unwrap_or(0) as f64 / 100.0;

        let client = self
            .auth
            .resolve_or_create(&client_email, &client_name)
            .await?;

        let reservation = self
            .reservations
            .create(&NewReservation {
                salon_id,
                client_id: client.id,
                service_type: session
                    .metadata
                    .get("service_type")
                    .cloned()
                    .unwrap_or_default(),
                appointment_date,
                duration_minutes: DEFAULT_DURATION_MINUTES,
                price,
                status: ReservationStatus::Confirmed,
                payment_status: PaymentStatus::Paid,
                checkout_session_id: Some(session.id.clone()),
                stripe_payment_id: Some(payment_ref),
                client_notes: None,
            })
            .await?;

        info!(
            reservation_id = reservation.id,
            session_id = %session.id,
            "Reservation created from webhook metadata"
        );

        self.notify_confirmation(&reservation).await;
        Ok(())
    }

    /// 退款（全额）
    pub async fn refund(&self, payment_intent_id: &str, reason: &str) -> AppResult<RefundOutcome> {
        let reservation = self
            .reservations
            .find_by_payment_reference(payment_intent_id)
            .await?
            .ok_or_else(|| AppError::not_found("Réservation non trouvée"))?;

        let refund = self.gateway.create_refund(payment_intent_id, reason).await?;

        self.reservations.mark_refunded(reservation.id).await?;

        info!(
            reservation_id = reservation.id,
            refund_id = %refund.id,
            "Reservation refunded"
        );

        Ok(RefundOutcome {
            refund_id: refund.id,
            status: refund.status,
            amount: refund.amount as f64 / 100.0,
        })
    }

    /// 查询退款列表（服务商透传）
    pub async fn list_refunds(&self, payment_intent_id: &str) -> AppResult<Vec<RefundItem>> {
        let refunds = self.gateway.list_refunds(payment_intent_id).await?;

        Ok(refunds
            .into_iter()
            .map(|r| RefundItem {
                id: r.id,
                amount: r.amount as f64 / 100.0,
                status: r.status,
                reason: r.reason,
                created: r.created,
            })
            .collect())
    }

    /// 确认邮件入队（尽力而为）
    async fn notify_confirmation(&self, reservation: &Reservation) {
        let salon_name = match self.salons.find_by_id(reservation.salon_id).await {
            Ok(Some(salon)) => salon.name,
            _ => {
                warn!(
                    salon_id = reservation.salon_id,
                    "Salon not found, skipping confirmation email"
                );
                return;
            }
        };

        match self.auth.user_by_id(reservation.client_id).await {
            Ok(Some(client)) => {
                self.notifier.send_booking_confirmation(
                    client.email,
                    client.name,
                    salon_name,
                    reservation.appointment_date,
                    reservation.service_type.clone(),
                    reservation.price,
                );
            }
            _ => {
                warn!(
                    client_id = reservation.client_id,
                    "Client not found, skipping confirmation email"
                );
            }
        }
    }
}

/// 元数据中的预约时间：RFC 3339，或无时区的 ISO 格式（按 UTC 处理）
fn parse_metadata_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|d| d.and_utc())
        })
}
