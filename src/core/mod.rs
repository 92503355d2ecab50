//! 子系统核心
//!
//! 包含配置与服务注册表。

pub mod config;
pub mod services;

// 重导出常用类型
pub use config::{LoaderConfig, LogConfig, ParentLoaderSelector};
pub use services::ServiceRegistry;
