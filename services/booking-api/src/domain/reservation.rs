//! 预约实体

use chrono::{DateTime, Duration, Utc};
use manikura_errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 预约生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            "completed" => Ok(ReservationStatus::Completed),
            other => Err(AppError::internal(format!(
                "Unknown reservation status: {}",
                other
            ))),
        }
    }
}

/// 支付状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(AppError::internal(format!(
                "Unknown payment status: {}",
                other
            ))),
        }
    }
}

/// 预约实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub salon_id: i64,
    pub client_id: i64,
    pub service_type: String,
    pub appointment_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub price: f64,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub checkout_session_id: Option<String>,
    pub stripe_payment_id: Option<String>,
    pub client_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// 预约结束时间
    pub fn end_time(&self) -> DateTime<Utc> {
        self.appointment_date + Duration::minutes(self.duration_minutes as i64)
    }

    /// 是否占用时段（取消的预约不占用）
    pub fn is_active(&self) -> bool {
        self.status != ReservationStatus::Cancelled
    }

    /// 与给定时间区间 [start, end) 是否重叠
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.appointment_date < end && start < self.end_time()
    }
}

/// 新预约字段
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub salon_id: i64,
    pub client_id: i64,
    pub service_type: String,
    pub appointment_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub price: f64,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub checkout_session_id: Option<String>,
    pub stripe_payment_id: Option<String>,
    pub client_notes: Option<String>,
}

/// 默认预约时长（分钟）
pub const DEFAULT_DURATION_MINUTES: i32 = 60;
