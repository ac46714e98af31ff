//! 沙龙查询与管理服务

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use manikura_common::Pagination;
use manikura_errors::{AppError, AppResult};
use serde::Serialize;
use tracing::info;

use crate::domain::repositories::{
    ReservationRepository, SalonFilter, SalonRepository, SalonSort,
};
use crate::domain::salon::{NewSalon, Salon};

/// 时段网格：每天 09:00 到 18:00 整点开始的 10 个时段
pub const FIRST_SLOT_HOUR: u32 = 9;
pub const LAST_SLOT_HOUR: u32 = 18;

/// 时段统一价格（欧元）
pub const SLOT_PRICE: f64 = 45.0;

/// 可预约时段
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilitySlot {
    pub time: String,
    pub available: bool,
    pub price: f64,
}

/// 某沙龙某日的可预约情况
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub salon_id: i64,
    pub date: NaiveDate,
    pub slots: Vec<AvailabilitySlot>,
}

/// 沙龙服务
pub struct SalonService {
    salons: Arc<dyn SalonRepository>,
    reservations: Arc<dyn ReservationRepository>,
}

impl SalonService {
    pub fn new(
        salons: Arc<dyn SalonRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        Self {
            salons,
            reservations,
        }
    }

    /// 按条件列出沙龙
    pub async fn list(
        &self,
        filter: &SalonFilter,
        sort: SalonSort,
        pagination: Pagination,
    ) -> AppResult<Vec<Salon>> {
        self.salons.list(filter, sort, pagination.clamped(100)).await
    }

    /// 文本检索
    pub async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<Salon>> {
        self.salons.search(term, limit.clamp(1, 50)).await
    }

    /// 热门沙龙
    pub async fn popular(&self, limit: i64) -> AppResult<Vec<Salon>> {
        self.salons.popular(limit.clamp(1, 50)).await
    }

    pub async fn get(&self, id: i64) -> AppResult<Salon> {
        self.salons
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Salon non trouvé"))
    }

    /// 创建沙龙
    pub async fn create(&self, salon: NewSalon) -> AppResult<Salon> {
        salon.validate()?;

        let salon = self.salons.create(&salon).await?;
        info!(salon_id = salon.id, name = %salon.name, "Salon created");
        Ok(salon)
    }

    /// 某日可预约时段：固定 09:00-18:00 整点网格，
    /// 与未取消预约重叠的时段标记为不可约
    pub async fn availability(&self, salon_id: i64, date: NaiveDate) -> AppResult<Availability> {
        // 沙龙必须存在
        self.get(salon_id).await?;

        let day_start = Utc.from_utc_datetime(
            &date
                .and_hms_opt(FIRST_SLOT_HOUR, 0, 0)
                .ok_or_else(|| AppError::validation("Invalid date"))?,
        );
        let day_end = day_start + Duration::hours((LAST_SLOT_HOUR - FIRST_SLOT_HOUR + 1) as i64);

        let booked = self
            .reservations
            .find_overlapping(salon_id, day_start, day_end)
            .await?;

        let mut slots = Vec::with_capacity((LAST_SLOT_HOUR - FIRST_SLOT_HOUR + 1) as usize);
        for hour in FIRST_SLOT_HOUR..=LAST_SLOT_HOUR {
            let slot_start = day_start + Duration::hours((hour - FIRST_SLOT_HOUR) as i64);
            let slot_end = slot_start + Duration::hours(1);

            let available = !booked
                .iter()
                .any(|r| r.is_active() && r.overlaps(slot_start, slot_end));

            slots.push(AvailabilitySlot {
                time: format!("{:02}:00", hour),
                available,
                price: SLOT_PRICE,
            });
        }

        Ok(Availability {
            salon_id,
            date,
            slots,
        })
    }

    /// 附近沙龙（地理检索未实现，按评分返回全部）
    pub async fn nearby(&self, limit: i64) -> AppResult<Vec<Salon>> {
        self.salons
            .list(
                &SalonFilter::default(),
                SalonSort::Rating,
                Pagination::new(0, limit.clamp(1, 100)),
            )
            .await
    }
}
