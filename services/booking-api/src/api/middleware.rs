//! 请求提取器

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use manikura_errors::AppError;
use tracing::debug;

use crate::api::state::AppState;
use crate::domain::user::User;

/// 已认证用户提取器
///
/// 缺失/非法令牌返回 Unauthorized
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::unauthorized("Missing or invalid authorization header")
        })?;

        let user = state.auth.current_user(&token).await?;
        Ok(CurrentUser(user))
    }
}

/// 可选认证提取器
///
/// 没有令牌或令牌无效时为匿名（MVP 行为，不拒绝请求）
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeUser(None));
        };

        match state.auth.current_user(&token).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(e) => {
                debug!(error = %e, "Ignoring invalid bearer token");
                Ok(MaybeUser(None))
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}
