//! EvalSystem - 课程与教师评价系统后端服务
//!
//! 基于 Actix Web 构建，核心是一组数据一致性规则：
//! 问题顺序的稠密编号、评价与回答的原子写入、教师评分的增量均值、以及分页游标。
//!
//! # 架构
//! - `config`: 配置管理
//! - `consistency`: 一致性规则（纯函数，不依赖存储）
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM / 进程内存储）
//! - `utils`: 工具函数

pub mod config;
pub mod consistency;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
