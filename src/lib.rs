//! CourseDesk - 课程教务后端服务
//!
//! 基于 Actix Web 构建，管理教材、课程与课时、学员名单以及课时图库。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis）
//! - `config`: 配置管理
//! - `drive`: Google Drive 文件存储
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `image_script`: 课时图片脚本客户端
//! - `middlewares`: 认证授权中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod drive;
pub mod entity;
pub mod errors;
pub mod image_script;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
