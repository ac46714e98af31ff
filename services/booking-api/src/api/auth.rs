//! 认证路由

use axum::extract::{Json, State};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use manikura_errors::AppResult;
use serde::{Deserialize, Serialize};

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::application::RegisterRequest;
use crate::domain::user::User;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub is_professional: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub is_professional: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            is_professional: user.is_professional,
            created_at: user.created_at,
        }
    }
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .auth
        .register(RegisterRequest {
            email: body.email,
            name: body.name,
            phone: body.phone,
            is_professional: body.is_professional,
        })
        .await?;

    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> AppResult<Json<LoginResponse>> {
    let outcome = state.auth.login(&body.email, &body.password).await?;

    Ok(Json(LoginResponse {
        access_token: outcome.access_token,
        token_type: "bearer".to_string(),
        expires_in: outcome.expires_in,
        user: outcome.user.into(),
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
