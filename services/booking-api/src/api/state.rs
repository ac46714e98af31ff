//! 共享应用状态

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use crate::application::{AuthService, PaymentService, ReservationService, SalonService};

/// 应用状态
///
/// 不可变，构建一次后随 Router 克隆
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub salons: Arc<SalonService>,
    pub reservations: Arc<ReservationService>,
    pub payments: Arc<PaymentService>,
    pub pool: PgPool,
    /// Prometheus 渲染句柄（测试中可为空）
    pub metrics: Option<PrometheusHandle>,
}
