//! Repository 接口定义

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manikura_common::Pagination;
use manikura_errors::AppResult;

use crate::domain::reservation::{NewReservation, Reservation, ReservationStatus};
use crate::domain::salon::{NewSalon, PriceRange, Salon};
use crate::domain::user::{NewUser, User};

/// 沙龙查询过滤条件（各条件相互独立，AND 组合）
#[derive(Debug, Clone, Default)]
pub struct SalonFilter {
    /// 城市子串（大小写不敏感）
    pub city: Option<String>,
    /// 价格档次（精确匹配）
    pub price_range: Option<PriceRange>,
    /// 评分下限
    pub min_rating: Option<f64>,
}

/// 沙龙排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalonSort {
    /// 评分降序（默认）
    #[default]
    Rating,
    /// 价格档次升序
    Price,
    /// 评价数降序
    Reviews,
}

impl SalonSort {
    /// 从查询参数解析，未知值回退为评分排序
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("price") => SalonSort::Price,
            Some("reviews") => SalonSort::Reviews,
            _ => SalonSort::Rating,
        }
    }
}

/// 用户 Repository
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// 插入新用户；邮箱唯一冲突映射为 Conflict
    async fn create(&self, user: &NewUser) -> AppResult<User>;
}

/// 沙龙 Repository
#[async_trait]
pub trait SalonRepository: Send + Sync {
    async fn list(
        &self,
        filter: &SalonFilter,
        sort: SalonSort,
        pagination: Pagination,
    ) -> AppResult<Vec<Salon>>;

    /// 全文子串检索：名称/描述/城市/地址，OR 组合，评分降序
    async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<Salon>>;

    /// 热门沙龙：评分 >= 4.5 且评价数 >= 20
    async fn popular(&self, limit: i64) -> AppResult<Vec<Salon>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Salon>>;

    async fn create(&self, salon: &NewSalon) -> AppResult<Salon>;
}

/// 预约 Repository
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// 插入新预约；同沙龙时段冲突（排除约束）映射为 Conflict
    async fn create(&self, reservation: &NewReservation) -> AppResult<Reservation>;

    async fn list(&self, pagination: Pagination) -> AppResult<Vec<Reservation>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Reservation>>;

    async fn find_by_checkout_session(&self, session_id: &str)
    -> AppResult<Option<Reservation>>;

    async fn find_by_payment_reference(
        &self,
        payment_id: &str,
    ) -> AppResult<Option<Reservation>>;

    /// 指定沙龙在 [start, end) 内的未取消预约
    async fn find_overlapping(
        &self,
        salon_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>>;

    /// 更新生命周期状态；返回是否命中记录
    async fn set_status(&self, id: i64, status: ReservationStatus) -> AppResult<bool>;

    /// 记录 checkout session 引用
    async fn set_checkout_session(&self, id: i64, session_id: &str) -> AppResult<()>;

    /// 标记已支付并保存支付引用
    async fn mark_paid(&self, id: i64, payment_id: &str) -> AppResult<()>;

    /// 退款：status=cancelled, payment_status=refunded
    async fn mark_refunded(&self, id: i64) -> AppResult<()>;
}
