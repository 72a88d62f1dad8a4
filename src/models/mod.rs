//! 数据模型定义
//!
//! 每个子模块按 `entities` / `requests` / `responses` 拆分。

pub mod common;
pub mod evaluations;
pub mod feedbacks;
pub mod questions;
pub mod teachers;
pub mod users;

pub use common::{ApiResponse, ErrorCode, Page, PageRequest};

/// 进程启动时间，用于输出启动耗时
#[derive(Debug, Clone, Copy)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
