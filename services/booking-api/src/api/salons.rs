//! 沙龙路由

use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::routing::get;
use chrono::NaiveDate;
use manikura_common::Pagination;
use manikura_errors::AppResult;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::application::Availability;
use crate::domain::repositories::{SalonFilter, SalonSort};
use crate::domain::salon::{NewSalon, Salon};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_salons).post(create_salon))
        .route("/search", get(search_salons))
        .route("/popular", get(popular_salons))
        .route("/nearby", get(nearby_salons))
        .route("/{salon_id}", get(get_salon))
        .route("/{salon_id}/availability", get(salon_availability))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub city: Option<String>,
    /// 按服务类型过滤（保留参数，当前不生效）
    pub service_type: Option<String>,
    pub price_range: Option<String>,
    pub min_rating: Option<f64>,
    /// 按日期/时间过滤可用性（保留参数，当前不生效）
    pub available_date: Option<NaiveDate>,
    pub available_time: Option<String>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 {
    20
}

async fn list_salons(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Salon>>> {
    let price_range = query.price_range.as_deref().map(str::parse).transpose()?;

    let filter = SalonFilter {
        city: query.city,
        price_range,
        min_rating: query.min_rating,
    };
    let sort = SalonSort::parse(query.sort_by.as_deref());

    let salons = state
        .salons
        .list(&filter, sort, Pagination::new(query.skip, query.limit))
        .await?;

    Ok(Json(salons))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 {
    10
}

async fn search_salons(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Salon>>> {
    let salons = state.salons.search(&query.q, query.limit).await?;
    Ok(Json(salons))
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    #[serde(default = "default_popular_limit")]
    pub limit: i64,
}

fn default_popular_limit() -> i64 {
    6
}

async fn popular_salons(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> AppResult<Json<Vec<Salon>>> {
    let salons = state.salons.popular(query.limit).await?;
    Ok(Json(salons))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_radius")]
    pub radius: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_radius() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct NearbyCenter {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub center: NearbyCenter,
    pub radius: i64,
    pub salons: Vec<Salon>,
    pub message: String,
}

/// 附近沙龙（地理检索未实现，按评分返回）
async fn nearby_salons(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> AppResult<Json<NearbyResponse>> {
    let salons = state.salons.nearby(query.limit).await?;

    Ok(Json(NearbyResponse {
        center: NearbyCenter {
            lat: query.lat,
            lng: query.lng,
        },
        radius: query.radius,
        salons,
        message: "Géolocalisation en cours d'implémentation".to_string(),
    }))
}

async fn get_salon(
    State(state): State<AppState>,
    Path(salon_id): Path<i64>,
) -> AppResult<Json<Salon>> {
    let salon = state.salons.get(salon_id).await?;
    Ok(Json(salon))
}

async fn create_salon(
    State(state): State<AppState>,
    Json(body): Json<NewSalon>,
) -> AppResult<Json<Salon>> {
    let salon = state.salons.create(body).await?;
    Ok(Json(salon))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

async fn salon_availability(
    State(state): State<AppState>,
    Path(salon_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Availability>> {
    let availability = state.salons.availability(salon_id, query.date).await?;
    Ok(Json(availability))
}
