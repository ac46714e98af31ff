//! manikura-auth-core - 认证核心库
//!
//! JWT/Claims 核心逻辑

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use manikura_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims
///
/// subject 为用户邮箱
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl Claims {
    pub fn new(email: &str, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: email.to_string(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
        }
    }

    pub fn email(&self) -> &str {
        &self.sub
    }
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: i64,
}

impl TokenService {
    pub fn new(secret: &str, expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
        }
    }

    /// 生成访问令牌
    pub fn generate_token(&self, email: &str) -> AppResult<String> {
        let claims = Claims::new(email, self.expires_in);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))
    }

    /// 验证令牌
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0; // 不允许时间偏差

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::unauthorized(format!("Invalid token: {}", e)))?;

        let claims = token_data.claims;

        // 额外验证：subject 必须存在
        if claims.sub.is_empty() {
            return Err(AppError::unauthorized("Token subject missing"));
        }

        Ok(claims)
    }

    /// 获取令牌过期时间（秒）
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        let service = TokenService::new("test_secret", 1800);

        let token = service.generate_token("client@example.com").unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.email(), "client@example.com");
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new("test_secret", -60);

        let token = service.generate_token("client@example.com").unwrap();
        let result = service.validate_token(&token);

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = TokenService::new("correct_secret", 1800);
        let other = TokenService::new("wrong_secret", 1800);

        let token = other.generate_token("client@example.com").unwrap();
        let result = service.validate_token(&token);

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = TokenService::new("test_secret", 1800);

        let result = service.validate_token("not-a-jwt");

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expires_in() {
        let service = TokenService::new("test_secret", 1800);
        assert_eq!(service.expires_in(), 1800);
    }
}
