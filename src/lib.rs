//! # Chips Dynload - 薯片动态类加载子系统
//!
//! 薯片生态的动态类加载子系统，在活动模块注册表之上提供一个
//! 身份稳定的动态类加载器：
//!
//! - **模块注册表**: 模块的安装、生命周期状态转换与事件广播
//! - **动态类加载器**: 父加载器优先、聚合所有 Active 模块导出包的类查找
//! - **加载器管理器**: 加载器的创建、事件驱动的缓存失效与停用
//! - **服务注册表**: 按名发布与查找容器内的共享服务
//! - **配置管理**: 统一的配置加载和管理
//! - **日志系统**: 结构化日志记录
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use chips_dynload::{
//!     ClassLoader, DynamicClassLoaderManager, LoaderConfig, ModuleClassLoader,
//!     ModuleMetadata, ModuleRegistry,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ModuleRegistry::new();
//!     let manager =
//!         DynamicClassLoaderManager::activate(&registry, &LoaderConfig::default()).await;
//!
//!     // 安装并启动一个导出 commons.util 包的模块
//!     let metadata = ModuleMetadata::new("commons-util", "Commons Util", "2.1.0")
//!         .with_export("commons.util");
//!     let module_loader = Arc::new(
//!         ModuleClassLoader::new("commons-util").with_class("commons.util.PropertiesUtil"),
//!     );
//!     registry.install(metadata, module_loader).await?;
//!     registry.start("commons-util").await?;
//!
//!     // 通过动态类加载器解析类
//!     let loader = manager.class_loader();
//!     let class = loader.load_class("commons.util.PropertiesUtil").await?;
//!     assert_eq!(class.defined_by, "commons-util");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## 模块结构
//!
//! - `module` - 模块元数据、生命周期与注册表
//! - `loader` - 类加载器抽象、动态类加载器与管理器
//! - `core` - 配置和服务注册表
//! - `utils` - 工具函数和错误类型

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod core;
pub mod loader;
pub mod module;
pub mod utils;

// 重导出常用类型，方便使用
pub use loader::{
    package_of, ClassLoader, DynamicClassLoader, DynamicClassLoaderManager, LoadedClass,
    ManagerState, RegistryView, Resource, SystemClassLoader, SERVICE_NAME, SYSTEM_LOADER_ID,
};

pub use module::{
    ModuleClassLoader, ModuleEvent, ModuleInfo, ModuleMetadata, ModuleRegistry, ModuleState,
};

pub use utils::logger::{
    fields, LogGuard, Logger, LoggerConfig, LoggerConfigBuilder, RotationStrategy,
};
pub use utils::{error_code, CoreError, Result};

pub use crate::core::config::{LoaderConfig, LoaderConfigBuilder, LogConfig, ParentLoaderSelector};
pub use crate::core::services::ServiceRegistry;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
