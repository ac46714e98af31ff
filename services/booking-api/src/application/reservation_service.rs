//! 预约服务

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use manikura_common::Pagination;
use manikura_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::application::notifier::Notifier;
use crate::domain::repositories::{ReservationRepository, SalonRepository, UserRepository};
use crate::domain::reservation::{
    NewReservation, PaymentStatus, Reservation, ReservationStatus,
};

/// 未认证请求使用的 MVP 默认客户（参见设计文档）
pub const DEFAULT_CLIENT_ID: i64 = 1;

/// 创建预约的请求字段
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub salon_id: i64,
    pub client_id: i64,
    pub service_type: String,
    pub appointment_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub price: f64,
    pub client_notes: Option<String>,
}

/// 预约服务
pub struct ReservationService {
    reservations: Arc<dyn ReservationRepository>,
    salons: Arc<dyn SalonRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Notifier,
}

impl ReservationService {
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        salons: Arc<dyn SalonRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            reservations,
            salons,
            users,
            notifier,
        }
    }

    /// 创建预约
    ///
    /// 时段冲突先在应用层预检，最终由存储层排除约束兜底
    pub async fn create(&self, request: CreateReservation) -> AppResult<Reservation> {
        let salon = self
            .salons
            .find_by_id(request.salon_id)
            .await?
            .ok_or_else(|| AppError::not_found("Salon non trouvé"))?;

        if request.duration_minutes <= 0 {
            return Err(AppError::validation("duration_minutes must be positive"));
        }

        let end = request.appointment_date + Duration::minutes(request.duration_minutes as i64);
        let conflicting = self
            .reservations
            .find_overlapping(request.salon_id, request.appointment_date, end)
            .await?;

        if !conflicting.is_empty() {
            return Err(AppError::conflict("Ce créneau est déjà réservé"));
        }

        let reservation = self
            .reservations
            .create(&NewReservation {
                salon_id: request.salon_id,
                client_id: request.client_id,
                service_type: request.service_type,
                appointment_date: request.appointment_date,
                duration_minutes: request.duration_minutes,
                price: request.price,
                status: ReservationStatus::Confirmed,
                payment_status: PaymentStatus::Pending,
                checkout_session_id: None,
                stripe_payment_id: None,
                client_notes: request.client_notes,
            })
            .await?;

        info!(
            reservation_id = reservation.id,
            salon_id = reservation.salon_id,
            "Reservation created"
        );

        // 确认邮件走后台队列，失败不影响请求
        match self.users.find_by_id(reservation.client_id).await {
            Ok(Some(client)) => {
                self.notifier.send_booking_confirmation(
                    client.email,
                    client.name,
                    salon.name,
                    reservation.appointment_date,
                    reservation.service_type.clone(),
                    reservation.price,
                );
            }
            Ok(None) => {
                warn!(
                    client_id = reservation.client_id,
                    "Client not found, skipping confirmation email"
                );
            }
            Err(e) => {
                warn!(error = %e, "Failed to load client for confirmation email");
            }
        }

        Ok(reservation)
    }

    /// 列出预约（当前不按调用方过滤）
    pub async fn list(&self, pagination: Pagination) -> AppResult<Vec<Reservation>> {
        self.reservations.list(pagination.clamped(100)).await
    }

    pub async fn get(&self, id: i64) -> AppResult<Reservation> {
        self.reservations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Réservation non trouvée"))
    }

    /// 取消预约：仅状态流转，不触发退款
    pub async fn cancel(&self, id: i64) -> AppResult<()> {
        let updated = self
            .reservations
            .set_status(id, ReservationStatus::Cancelled)
            .await?;

        if !updated {
            return Err(AppError::not_found("Réservation non trouvée"));
        }

        info!(reservation_id = id, "Reservation cancelled");
        Ok(())
    }
}
