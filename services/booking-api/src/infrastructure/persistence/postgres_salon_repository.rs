//! PostgreSQL 沙龙 Repository 实现

use async_trait::async_trait;
use manikura_common::Pagination;
use manikura_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::repositories::{SalonFilter, SalonRepository, SalonSort};
use crate::domain::salon::{NewSalon, Salon};

const SALON_COLUMNS: &str = "id, name, description, address, city, phone, email, rating, \
     total_reviews, price_range, image_url, open_time, close_time, owner_id, created_at";

pub struct PostgresSalonRepository {
    pool: PgPool,
}

impl PostgresSalonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 排序子句（常量字符串，不含外部输入）
fn order_clause(sort: SalonSort) -> &'static str {
    match sort {
        SalonSort::Rating => "rating DESC",
        SalonSort::Price => "CASE price_range WHEN '€' THEN 1 WHEN '€€' THEN 2 ELSE 3 END ASC",
        SalonSort::Reviews => "total_reviews DESC",
    }
}

#[async_trait]
impl SalonRepository for PostgresSalonRepository {
    async fn list(
        &self,
        filter: &SalonFilter,
        sort: SalonSort,
        pagination: Pagination,
    ) -> AppResult<Vec<Salon>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM salons
            WHERE ($1::text IS NULL OR city ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR price_range = $2)
              AND ($3::float8 IS NULL OR rating >= $3)
            ORDER BY {}
            LIMIT $4 OFFSET $5
            "#,
            SALON_COLUMNS,
            order_clause(sort)
        );

        let rows = sqlx::query_as::<_, SalonRow>(&sql)
            .bind(&filter.city)
            .bind(filter.price_range.map(|p| p.as_str()))
            .bind(filter.min_rating)
            .bind(pagination.limit)
            .bind(pagination.skip)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list salons: {}", e)))?;

        rows.into_iter().map(SalonRow::into_salon).collect()
    }

    async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<Salon>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM salons
            WHERE name ILIKE '%' || $1 || '%'
               OR description ILIKE '%' || $1 || '%'
               OR city ILIKE '%' || $1 || '%'
               OR address ILIKE '%' || $1 || '%'
            ORDER BY rating DESC
            LIMIT $2
            "#,
            SALON_COLUMNS
        );

        let rows = sqlx::query_as::<_, SalonRow>(&sql)
            .bind(term)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to search salons: {}", e)))?;

        rows.into_iter().map(SalonRow::into_salon).collect()
    }

    async fn popular(&self, limit: i64) -> AppResult<Vec<Salon>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM salons
            WHERE rating >= 4.5 AND total_reviews >= 20
            ORDER BY rating DESC, total_reviews DESC
            LIMIT $1
            "#,
            SALON_COLUMNS
        );

        let rows = sqlx::query_as::<_, SalonRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list popular salons: {}", e)))?;

        rows.into_iter().map(SalonRow::into_salon).collect()
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Salon>> {
        let sql = format!("SELECT {} FROM salons WHERE id = $1", SALON_COLUMNS);

        let row = sqlx::query_as::<_, SalonRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to find salon: {}", e)))?;

        row.map(SalonRow::into_salon).transpose()
    }

    async fn create(&self, salon: &NewSalon) -> AppResult<Salon> {
        let sql = format!(
            r#"
            INSERT INTO salons (name, description, address, city, phone, email,
                                price_range, image_url, open_time, close_time, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            SALON_COLUMNS
        );

        let row = sqlx::query_as::<_, SalonRow>(&sql)
            .bind(&salon.name)
            .bind(&salon.description)
            .bind(&salon.address)
            .bind(&salon.city)
            .bind(&salon.phone)
            .bind(&salon.email)
            .bind(salon.price_range.as_str())
            .bind(&salon.image_url)
            .bind(salon.open_time)
            .bind(salon.close_time)
            .bind(salon.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create salon: {}", e)))?;

        row.into_salon()
    }
}

#[derive(sqlx::FromRow)]
struct SalonRow {
    id: i64,
    name: String,
    description: String,
    address: String,
    city: String,
    phone: String,
    email: String,
    rating: f64,
    total_reviews: i32,
    price_range: String,
    image_url: Option<String>,
    open_time: chrono::NaiveTime,
    close_time: chrono::NaiveTime,
    owner_id: Option<i64>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl SalonRow {
    fn into_salon(self) -> AppResult<Salon> {
        let price_range = self.price_range.parse().map_err(|_| {
            AppError::database(format!(
                "Invalid price_range in database for salon {}: {}",
                self.id, self.price_range
            ))
        })?;

        Ok(Salon {
            id: self.id,
            name: self.name,
            description: self.description,
            address: self.address,
            city: self.city,
            phone: self.phone,
            email: self.email,
            rating: self.rating,
            total_reviews: self.total_reviews,
            price_range,
            image_url: self.image_url,
            open_time: self.open_time,
            close_time: self.close_time,
            owner_id: self.owner_id,
            created_at: self.created_at,
        })
    }
}
