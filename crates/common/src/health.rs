//! 通用健康检查模块
//!
//! 提供健康检查结果的基础类型和聚合

use serde::{Deserialize, Serialize};

/// 基础健康检查结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseHealthResult {
    /// 是否健康
    pub healthy: bool,
    /// 延迟（毫秒）
    pub latency_ms: Option<u64>,
    /// 错误信息
    pub error: Option<String>,
}

impl BaseHealthResult {
    /// 创建健康结果
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            healthy: true,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    /// 创建不健康结果
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            latency_ms: None,
            error: Some(error.into()),
        }
    }
}

/// 聚合多个健康检查结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedHealthResult {
    /// 整体是否健康
    pub healthy: bool,
    /// 各组件状态
    pub components: Vec<ComponentHealth>,
}

/// 组件健康状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// 组件名称
    pub name: String,
    /// 是否健康
    pub healthy: bool,
    /// 延迟（毫秒）
    pub latency_ms: Option<u64>,
    /// 错误信息
    pub error: Option<String>,
}

impl AggregatedHealthResult {
    /// 创建新的聚合结果
    pub fn new() -> Self {
        Self {
            healthy: true,
            components: Vec::new(),
        }
    }

    /// 添加组件状态
    pub fn add_component(&mut self, name: impl Into<String>, result: BaseHealthResult) {
        let component = ComponentHealth {
            name: name.into(),
            healthy: result.healthy,
            latency_ms: result.latency_ms,
            error: result.error,
        };

        if !component.healthy {
            self.healthy = false;
        }

        self.components.push(component);
    }
}

impl Default for AggregatedHealthResult {
    fn default() -> Self {
        Self::new()
    }
}
