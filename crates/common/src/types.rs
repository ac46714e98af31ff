//! 通用类型定义

use serde::{Deserialize, Serialize};

/// 分页参数
///
/// API 层使用 skip/limit 风格的查询参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, limit: 20 }
    }
}

impl Pagination {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }

    /// 规范化参数，防止负偏移和过大的页
    pub fn clamped(self, max_limit: i64) -> Self {
        Self {
            skip: self.skip.max(0),
            limit: self.limit.clamp(1, max_limit),
        }
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub skip: i64,
    pub limit: i64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        Self {
            items,
            total,
            skip: pagination.skip,
            limit: pagination.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_default() {
        let p = Pagination::default();
        assert_eq!(p.skip, 0);
        assert_eq!(p.limit, 20);
    }

    #[test]
    fn test_pagination_clamped() {
        let p = Pagination::new(-5, 500).clamped(100);
        assert_eq!(p.skip, 0);
        assert_eq!(p.limit, 100);

        let p = Pagination::new(10, 0).clamped(100);
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn test_paged_result() {
        let pagination = Pagination::new(20, 10);
        let result = PagedResult::new(vec![1, 2, 3], 53, &pagination);

        assert_eq!(result.items.len(), 3);
        assert_eq!(result.total, 53);
        assert_eq!(result.skip, 20);
        assert_eq!(result.limit, 10);
    }
}
