//! 认证服务

use std::sync::Arc;

use manikura_auth_core::TokenService;
use manikura_errors::{AppError, AppResult};
use tracing::info;

use crate::domain::email::Email;
use crate::domain::repositories::UserRepository;
use crate::domain::user::{NewUser, User};

/// 注册请求字段
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub is_professional: bool,
}

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub expires_in: i64,
    pub user: User,
}

/// 认证服务
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// 注册新用户，邮箱重复返回 Conflict
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        let email = Email::new(&request.email)?;

        if self.users.find_by_email(email.as_str()).await?.is_some() {
            return Err(AppError::conflict("Email déjà enregistré"));
        }

        let user = self
            .users
            .create(&NewUser::new(
                email,
                request.name,
                request.phone,
                request.is_professional,
            ))
            .await?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// 登录（MVP 简化：不校验密码；邮箱未知时自动建档）
    pub async fn login(&self, email: &str, _password: &str) -> AppResult<LoginOutcome> {
        let email = Email::new(email)?;

        let user = match self.users.find_by_email(email.as_str()).await? {
            Some(user) => user,
            None => {
                let user = self
                    .users
                    .create(&NewUser::provisioned_from_email(email))
                    .await?;
                info!(user_id = user.id, "User auto-provisioned on login");
                user
            }
        };

        let access_token = self.tokens.generate_token(&user.email)?;

        Ok(LoginOutcome {
            access_token,
            expires_in: self.tokens.expires_in(),
            user,
        })
    }

    /// 解析令牌对应的当前用户
    pub async fn current_user(&self, token: &str) -> AppResult<User> {
        let claims = self.tokens.validate_token(token)?;

        self.users
            .find_by_email(claims.email())
            .await?
            .ok_or_else(|| AppError::unauthorized("Could not validate credentials"))
    }

    /// 按 id 查询用户
    pub async fn user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    /// 按邮箱取回或懒创建用户（支付路径使用）
    pub async fn resolve_or_create(&self, email: &str, name: &str) -> AppResult<User> {
        let email = Email::new(email)?;

        if let Some(user) = self.users.find_by_email(email.as_str()).await? {
            return Ok(user);
        }

        let new_user = if name.is_empty() {
            NewUser::provisioned_from_email(email)
        } else {
            NewUser::new(email, name, "", false)
        };

        let user = self.users.create(&new_user).await?;
        info!(user_id = user.id, "User auto-provisioned from payment metadata");
        Ok(user)
    }
}
