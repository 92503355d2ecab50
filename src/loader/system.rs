//! 系统类加载器
//!
//! 动态类加载器的委托父加载器，对应容器的系统加载器。
//! 先委托父加载器保证了平台类的标准委托语义，也防止模块遮蔽平台类。

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::loader::types::{ClassLoader, LoadedClass, Resource, SYSTEM_LOADER_ID};
use crate::utils::{CoreError, Result};

/// 内置平台类集合
const PLATFORM_CLASSES: &[&str] = &[
    "sys.lang.Text",
    "sys.lang.Number",
    "sys.lang.Sequence",
    "sys.io.Stream",
    "sys.io.Buffer",
];

/// 系统类加载器
///
/// 独立于模块注册表的加载器，内容在构造时固定。
#[derive(Debug, Default)]
pub struct SystemClassLoader {
    classes: HashSet<String>,
    resources: HashMap<String, Arc<Vec<u8>>>,
}

impl SystemClassLoader {
    /// 创建空的系统加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带内置平台类集合的系统加载器
    pub fn with_platform() -> Self {
        Self {
            classes: PLATFORM_CLASSES.iter().map(|s| s.to_string()).collect(),
            resources: HashMap::new(),
        }
    }

    /// 追加一个系统类
    pub fn with_class(mut self, name: impl Into<String>) -> Self {
        self.classes.insert(name.into());
        self
    }

    /// 追加一个系统资源
    pub fn with_resource(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.resources.insert(name.into(), Arc::new(bytes));
        self
    }

    /// 是否包含指定类
    pub fn defines(&self, name: &str) -> bool {
        self.classes.contains(name)
    }
}

#[async_trait]
impl ClassLoader for SystemClassLoader {
    async fn load_class(&self, name: &str) -> Result<LoadedClass> {
        if self.classes.contains(name) {
            Ok(LoadedClass::new(name, SYSTEM_LOADER_ID))
        } else {
            Err(CoreError::ClassNotFound(name.to_string()))
        }
    }

    async fn resource(&self, name: &str) -> Option<Resource> {
        self.resources.get(name).map(|bytes| Resource {
            name: name.to_string(),
            bytes: Arc::clone(bytes),
            source: SYSTEM_LOADER_ID.to_string(),
        })
    }

    async fn resources(&self, name: &str) -> Vec<Resource> {
        self.resource(name).await.into_iter().collect()
    }
}
