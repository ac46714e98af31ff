//! 预约路由

use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::routing::{get, patch, post};
use chrono::{DateTime, Utc};
use manikura_common::Pagination;
use manikura_errors::AppResult;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::middleware::MaybeUser;
use crate::api::state::AppState;
use crate::application::{CreateReservation, DEFAULT_CLIENT_ID};
use crate::domain::reservation::{DEFAULT_DURATION_MINUTES, Reservation};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_reservation).get(list_reservations))
        .route("/{reservation_id}", get(get_reservation))
        .route("/{reservation_id}/cancel", patch(cancel_reservation))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    pub salon_id: i64,
    pub service_type: String,
    pub appointment_date: DateTime<Utc>,
    #[serde(default = "default_duration")]
    pub duration_minutes: i32,
    pub price: f64,
    pub client_notes: Option<String>,
}

fn default_duration() -> i32 {
    DEFAULT_DURATION_MINUTES
}

async fn create_reservation(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(body): Json<CreateBody>,
) -> AppResult<Json<Reservation>> {
    // 带令牌时使用请求者身份，否则退回 MVP 默认客户
    let client_id = user.map(|u| u.id).unwrap_or(DEFAULT_CLIENT_ID);

    let reservation = state
        .reservations
        .create(CreateReservation {
            salon_id: body.salon_id,
            client_id,
            service_type: body.service_type,
            appointment_date: body.appointment_date,
            duration_minutes: body.duration_minutes,
            price: body.price,
            client_notes: body.client_notes,
        })
        .await?;

    Ok(Json(reservation))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 {
    20
}

async fn list_reservations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = state
        .reservations
        .list(Pagination::new(query.skip, query.limit))
        .await?;

    Ok(Json(reservations))
}

async fn get_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.reservations.get(reservation_id).await?;
    Ok(Json(reservation))
}

async fn cancel_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.reservations.cancel(reservation_id).await?;

    Ok(Json(json!({
        "message": "Réservation annulée avec succès"
    })))
}
