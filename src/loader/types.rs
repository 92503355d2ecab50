//! 类加载器契约
//!
//! 定义宿主运行时的标准类加载接口，以及类与资源的句柄类型。
//! 模块的内在加载器、系统加载器和动态类加载器都实现同一接口。

use async_trait::async_trait;
use std::sync::Arc;

use crate::utils::Result;

/// 系统加载器的标识（LoadedClass::defined_by 中使用）
pub const SYSTEM_LOADER_ID: &str = "system";

/// 取类的全限定名中的包名部分
///
/// 最后一个 `.` 之前的内容；顶层类返回空字符串。
pub fn package_of(class_name: &str) -> &str {
    match class_name.rfind('.') {
        Some(idx) => &class_name[..idx],
        None => "",
    }
}

/// 从资源路径推导所属包名
///
/// 资源以 `/` 分隔目录（如 `commons/util/defaults.properties`），
/// 目录部分按 `.` 连接即为候选选择所用的包名。
pub fn package_of_resource(resource_name: &str) -> String {
    let trimmed = resource_name.trim_start_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..idx].replace('/', "."),
        None => String::new(),
    }
}

/// 已加载的类句柄
///
/// 宿主运行时中"类对象"的不透明表示。`defined_by` 记录定义它的
/// 加载器（模块 ID 或 [`SYSTEM_LOADER_ID`]），对应原生运行时中
/// "defining class loader" 的可观测语义。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedClass {
    /// 类的全限定名
    pub name: String,

    /// 类所在的包名
    pub package: String,

    /// 定义该类的加载器标识
    pub defined_by: String,
}

impl LoadedClass {
    /// 创建类句柄
    pub fn new(name: impl Into<String>, defined_by: impl Into<String>) -> Self {
        let name = name.into();
        let package = package_of(&name).to_string();
        Self {
            name,
            package,
            defined_by: defined_by.into(),
        }
    }
}

/// 资源句柄
///
/// 字节内容以 `Arc` 共享，多次查找不复制。
#[derive(Debug, Clone)]
pub struct Resource {
    /// 资源名（`/` 分隔路径）
    pub name: String,

    /// 资源内容
    pub bytes: Arc<Vec<u8>>,

    /// 提供该资源的加载器标识
    pub source: String,
}

impl Resource {
    /// 创建资源句柄
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes),
            source: source.into(),
        }
    }

    /// 获取资源内容（getResourceAsStream 的对应物）
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// 类加载器接口
///
/// 宿主运行时的标准类加载契约。类查找失败以
/// [`CoreError::ClassNotFound`](crate::CoreError::ClassNotFound) 表达；
/// 资源查找失败返回 `None` / 空集合而非错误。
#[async_trait]
pub trait ClassLoader: Send + Sync {
    /// 加载类
    ///
    /// # Errors
    ///
    /// - `ClassNotFound`: 该加载器无法解析此类名
    /// - `LinkageFailure`: 类定义中途失败，原样传播
    async fn load_class(&self, name: &str) -> Result<LoadedClass>;

    /// 查找单个资源，未命中返回 `None`
    async fn resource(&self, name: &str) -> Option<Resource>;

    /// 查找所有同名资源，按候选顺序返回
    async fn resources(&self, name: &str) -> Vec<Resource>;
}
