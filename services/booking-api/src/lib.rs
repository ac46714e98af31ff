//! Manikura 预约服务
//!
//! 美甲沙龙预约平台后端：沙龙检索、预约管理、用户认证、支付集成

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
