//! 模块管理
//!
//! 包含模块侧的核心组件：
//! - 模块元数据与生命周期状态定义
//! - 模块内在类加载器
//! - 容器侧的活动注册表

pub mod class_loader;
pub mod metadata;
pub mod registry;

// 重导出常用类型
pub use class_loader::ModuleClassLoader;
pub use metadata::{ModuleInfo, ModuleMetadata, ModuleState};
pub use registry::{ModuleEvent, ModuleRegistry};
