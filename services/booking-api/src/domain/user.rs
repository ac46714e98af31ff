//! 用户实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::email::Email;

/// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub is_professional: bool,
    pub created_at: DateTime<Utc>,
}

/// 新用户字段（注册 / 懒创建）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub phone: String,
    pub is_professional: bool,
}

impl NewUser {
    pub fn new(email: Email, name: impl Into<String>, phone: impl Into<String>, is_professional: bool) -> Self {
        Self {
            email,
            name: name.into(),
            phone: phone.into(),
            is_professional,
        }
    }

    /// 登录 / 支付回调时按邮箱懒创建的用户：
    /// 名字取邮箱本地部分，非专业账户
    pub fn provisioned_from_email(email: Email) -> Self {
        let name = email.local_part().to_string();
        Self {
            email,
            name,
            phone: String::new(),
            is_professional: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioned_from_email() {
        let email = Email::new("sophie@example.com").unwrap();
        let user = NewUser::provisioned_from_email(email);

        assert_eq!(user.name, "sophie");
        assert_eq!(user.email.as_str(), "sophie@example.com");
        assert_eq!(user.phone, "");
        assert!(!user.is_professional);
    }
}
