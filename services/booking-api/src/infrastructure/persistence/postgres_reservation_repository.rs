//! PostgreSQL 预约 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manikura_common::Pagination;
use manikura_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::repositories::ReservationRepository;
use crate::domain::reservation::{NewReservation, Reservation, ReservationStatus};

const RESERVATION_COLUMNS: &str = "id, salon_id, client_id, service_type, appointment_date, \
     duration_minutes, price, status, payment_status, checkout_session_id, stripe_payment_id, \
     client_notes, created_at";

pub struct PostgresReservationRepository {
    pool: PgPool,
}

impl PostgresReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for PostgresReservationRepository {
    async fn create(&self, reservation: &NewReservation) -> AppResult<Reservation> {
        let sql = format!(
            r#"
            INSERT INTO reservations (salon_id, client_id, service_type, appointment_date,
                                      duration_minutes, price, status, payment_status,
                                      checkout_session_id, stripe_payment_id, client_notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        );

        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(reservation.salon_id)
            .bind(reservation.client_id)
            .bind(&reservation.service_type)
            .bind(reservation.appointment_date)
            .bind(reservation.duration_minutes)
            .bind(reservation.price)
            .bind(reservation.status.as_str())
            .bind(reservation.payment_status.as_str())
            .bind(&reservation.checkout_session_id)
            .bind(&reservation.stripe_payment_id)
            .bind(&reservation.client_notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                // 排除约束（时段冲突）
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23P01") => {
                    AppError::conflict("Ce créneau est déjà réservé")
                }
                _ => AppError::database(format!("Failed to create reservation: {}", e)),
            })?;

        row.into_reservation()
    }

    async fn list(&self, pagination: Pagination) -> AppResult<Vec<Reservation>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM reservations
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
            RESERVATION_COLUMNS
        );

        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(pagination.limit)
            .bind(pagination.skip)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list reservations: {}", e)))?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {} FROM reservations WHERE id = $1",
            RESERVATION_COLUMNS
        );

        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to find reservation: {}", e)))?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> AppResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {} FROM reservations WHERE checkout_session_id = $1",
            RESERVATION_COLUMNS
        );

        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to find reservation: {}", e)))?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn find_by_payment_reference(
        &self,
        payment_id: &str,
    ) -> AppResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {} FROM reservations WHERE stripe_payment_id = $1",
            RESERVATION_COLUMNS
        );

        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to find reservation: {}", e)))?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn find_overlapping(
        &self,
        salon_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM reservations
            WHERE salon_id = $1
              AND status <> 'cancelled'
              AND appointment_date < $3
              AND appointment_date + make_interval(mins => duration_minutes) > $2
            ORDER BY appointment_date ASC
            "#,
            RESERVATION_COLUMNS
        );

        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(salon_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to find overlapping reservations: {}", e))
            })?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }

    async fn set_status(&self, id: i64, status: ReservationStatus) -> AppResult<bool> {
        let result = sqlx::query("UPDATE reservations SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to update reservation status: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_checkout_session(&self, id: i64, session_id: &str) -> AppResult<()> {
        sqlx::query("UPDATE reservations SET checkout_session_id = $2 WHERE id = $1")
            .bind(id)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to record checkout session: {}", e))
            })?;

        Ok(())
    }

    async fn mark_paid(&self, id: i64, payment_id: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE reservations SET payment_status = 'paid', stripe_payment_id = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(payment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark reservation paid: {}", e)))?;

        Ok(())
    }

    async fn mark_refunded(&self, id: i64) -> AppResult<()> {
        sqlx::query(
            "UPDATE reservations SET status = 'cancelled', payment_status = 'refunded' WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark reservation refunded: {}", e)))?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    salon_id: i64,
    client_id: i64,
    service_type: String,
    appointment_date: chrono::DateTime<chrono::Utc>,
    duration_minutes: i32,
    price: f64,
    status: String,
    payment_status: String,
    checkout_session_id: Option<String>,
    stripe_payment_id: Option<String>,
    client_notes: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl ReservationRow {
    fn into_reservation(self) -> AppResult<Reservation> {
        let status = self.status.parse()?;
        let payment_status = self.payment_status.parse()?;

        Ok(Reservation {
            id: self.id,
            salon_id: self.salon_id,
            client_id: self.client_id,
            service_type: self.service_type,
            appointment_date: self.appointment_date,
            duration_minutes: self.duration_minutes,
            price: self.price,
            status,
            payment_status,
            checkout_session_id: self.checkout_session_id,
            stripe_payment_id: self.stripe_payment_id,
            client_notes: self.client_notes,
            created_at: self.created_at,
        })
    }
}
