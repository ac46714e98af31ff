//! 沙龙实体

use chrono::{DateTime, NaiveTime, Utc};
use manikura_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 价格档次（€ < €€ < €€€）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PriceRange {
    Budget,
    Standard,
    Premium,
}

impl PriceRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::Budget => "€",
            PriceRange::Standard => "€€",
            PriceRange::Premium => "€€€",
        }
    }

    /// 排序用的序数
    pub fn ordinal(&self) -> i16 {
        match self {
            PriceRange::Budget => 1,
            PriceRange::Standard => 2,
            PriceRange::Premium => 3,
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PriceRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "€" => Ok(PriceRange::Budget),
            "€€" => Ok(PriceRange::Standard),
            "€€€" => Ok(PriceRange::Premium),
            other => Err(AppError::validation(format!(
                "Invalid price range: {} (expected €, €€ or €€€)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for PriceRange {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PriceRange> for String {
    fn from(value: PriceRange) -> Self {
        value.as_str().to_string()
    }
}

/// 沙龙实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salon {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: String,
    pub rating: f64,
    pub total_reviews: i32,
    pub price_range: PriceRange,
    pub image_url: Option<String>,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 新沙龙字段
#[derive(Debug, Clone, Deserialize)]
pub struct NewSalon {
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: String,
    pub price_range: PriceRange,
    pub image_url: Option<String>,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub owner_id: Option<i64>,
}

impl NewSalon {
    /// 校验营业时间：开门必须早于关门
    pub fn validate(&self) -> AppResult<()> {
        if self.open_time >= self.close_time {
            return Err(AppError::validation(
                "open_time must be earlier than close_time",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_range_ordering() {
        assert!(PriceRange::Budget < PriceRange::Standard);
        assert!(PriceRange::Standard < PriceRange::Premium);
        assert_eq!(PriceRange::Budget.ordinal(), 1);
        assert_eq!(PriceRange::Premium.ordinal(), 3);
    }

    #[test]
    fn test_price_range_parse() {
        assert_eq!("€".parse::<PriceRange>().unwrap(), PriceRange::Budget);
        assert_eq!("€€".parse::<PriceRange>().unwrap(), PriceRange::Standard);
        assert_eq!("€€€".parse::<PriceRange>().unwrap(), PriceRange::Premium);
        assert!("€€€€".parse::<PriceRange>().is_err());
        assert!("cheap".parse::<PriceRange>().is_err());
    }

    #[test]
    fn test_price_range_serde_roundtrip() {
        let json = serde_json::to_string(&PriceRange::Standard).unwrap();
        assert_eq!(json, "\"€€\"");

        let parsed: PriceRange = serde_json::from_str("\"€€€\"").unwrap();
        assert_eq!(parsed, PriceRange::Premium);
    }

    fn new_salon(open: &str, close: &str) -> NewSalon {
        NewSalon {
            name: "Ongles & Co".to_string(),
            description: "Institut de beauté des ongles".to_string(),
            address: "12 rue de la Paix".to_string(),
            city: "Paris".to_string(),
            phone: "0140000000".to_string(),
            email: "contact@ongles.fr".to_string(),
            price_range: PriceRange::Standard,
            image_url: None,
            open_time: open.parse().unwrap(),
            close_time: close.parse().unwrap(),
            owner_id: None,
        }
    }

    #[test]
    fn test_new_salon_validation() {
        assert!(new_salon("09:00:00", "18:00:00").validate().is_ok());
        assert!(new_salon("18:00:00", "09:00:00").validate().is_err());
        assert!(new_salon("09:00:00", "09:00:00").validate().is_err());
    }
}
