//! Saffron Server - 香料电商目录与订单后端
//!
//! # 架构概述
//!
//! - **目录引擎** (`catalog`): 变体/属性一致性校验、发布就绪检查、
//!   缩略图协调、商品列表缓存
//! - **结算** (`checkout`): 条件扣减库存的下单事务与支付会话
//! - **数据库** (`db`): SQLite (sqlx) 连接池、迁移与仓储
//! - **认证** (`auth`): JWT 认证与角色守卫
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! saffron-server/src/
//! ├── core/          # 配置、状态、HTTP 服务器
//! ├── auth/          # JWT 认证
//! ├── catalog/       # 目录规则引擎与服务
//! ├── checkout/      # 结算事务与支付
//! ├── storage/       # 图片文件存储
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod core;
pub mod db;
pub mod storage;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService, Role};
pub use catalog::{CatalogService, CatalogViolations, ListingCache};
pub use checkout::CheckoutService;
pub use core::{Config, Server, ServerState};
pub use db::DbService;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
