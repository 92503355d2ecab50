//! 动态类加载
//!
//! 加载器侧的核心组件：
//! - 类加载器抽象与加载结果类型
//! - 系统类加载器（委托父加载器）
//! - 注册表只读视图
//! - 动态类加载器与其管理器

pub mod dynamic;
pub mod manager;
pub mod system;
pub mod types;
pub mod view;

// 重导出常用类型
pub use dynamic::DynamicClassLoader;
pub use manager::{DynamicClassLoaderManager, ManagerState, SERVICE_NAME};
pub use system::SystemClassLoader;
pub use types::{package_of, ClassLoader, LoadedClass, Resource, SYSTEM_LOADER_ID};
pub use view::RegistryView;
