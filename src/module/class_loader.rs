//! 模块内在类加载器
//!
//! 每个模块在安装时携带一个内在加载器，负责定义它所拥有的类和资源。
//! 内在加载器不关心模块的生命周期状态——状态过滤是动态类加载器的职责；
//! 直接使用内在加载器总能解析其拥有的类。

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::loader::types::{ClassLoader, LoadedClass, Resource};
use crate::utils::{CoreError, Result};

/// 类表条目
///
/// 模拟运行时中，一个类要么可以正常定义，要么携带一个注入的链接缺陷
/// （对应字节码缺陷导致的定义中途失败）。
#[derive(Debug, Clone)]
enum ClassEntry {
    /// 可正常定义的类
    Defined,
    /// 定义时会触发链接失败
    Linkage(String),
}

/// 模块内在类加载器
///
/// 持有模块拥有的类表与资源表。内容在安装时固定，之后只读，
/// 因此可以被任意任务并发查询。
#[derive(Debug)]
pub struct ModuleClassLoader {
    /// 所属模块 ID
    module_id: String,

    /// 类表：全限定名 -> 条目
    classes: HashMap<String, ClassEntry>,

    /// 资源表：资源名 -> 内容
    resources: HashMap<String, Arc<Vec<u8>>>,
}

impl ModuleClassLoader {
    /// 创建空的内在加载器
    pub fn new(module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            classes: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    /// 声明一个本模块拥有的类
    pub fn with_class(mut self, name: impl Into<String>) -> Self {
        self.classes.insert(name.into(), ClassEntry::Defined);
        self
    }

    /// 声明一个定义时会链接失败的类
    ///
    /// 用于表达字节码存在缺陷的类：查找到它的调用方必须看到失败本身，
    /// 而不是退回 ClassNotFound。
    pub fn with_linkage_failure(
        mut self,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.classes
            .insert(name.into(), ClassEntry::Linkage(reason.into()));
        self
    }

    /// 声明一个本模块携带的资源
    pub fn with_resource(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.resources.insert(name.into(), Arc::new(bytes));
        self
    }

    /// 所属模块 ID
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// 本加载器拥有的类数量
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

#[async_trait]
impl ClassLoader for ModuleClassLoader {
    async fn load_class(&self, name: &str) -> Result<LoadedClass> {
        match self.classes.get(name) {
            Some(ClassEntry::Defined) => {
                trace!(
                    module_id = %self.module_id,
                    class_name = %name,
                    "内在加载器定义类"
                );
                Ok(LoadedClass::new(name, &self.module_id))
            }
            Some(ClassEntry::Linkage(reason)) => Err(CoreError::LinkageFailure {
                class_name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(CoreError::ClassNotFound(name.to_string())),
        }
    }

    async fn resource(&self, name: &str) -> Option<Resource> {
        self.resources.get(name).map(|bytes| Resource {
            name: name.to_string(),
            bytes: Arc::clone(bytes),
            source: self.module_id.clone(),
        })
    }

    async fn resources(&self, name: &str) -> Vec<Resource> {
        self.resource(name).await.into_iter().collect()
    }
}
