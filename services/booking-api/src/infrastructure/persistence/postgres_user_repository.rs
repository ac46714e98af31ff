//! PostgreSQL 用户 Repository 实现

use async_trait::async_trait;
use manikura_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::repositories::UserRepository;
use crate::domain::user::{NewUser, User};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, phone, is_professional, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, phone, is_professional, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        Ok(row.map(UserRow::into_user))
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, name, phone, is_professional)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, phone, is_professional, created_at
            "#,
        )
        .bind(user.email.as_str())
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.is_professional)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::conflict("Email déjà enregistré")
            }
            _ => AppError::database(format!("Failed to create user: {}", e)),
        })?;

        Ok(row.into_user())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    phone: String,
    is_professional: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            phone: self.phone,
            is_professional: self.is_professional,
            created_at: self.created_at,
        }
    }
}
