//! 模块注册表只读视图
//!
//! 动态类加载器一侧看到的注册表：只读、可从任意任务并发访问。
//! 视图只持有注册表内部状态的弱引用，因此既不会阻止容器销毁，
//! 也不会在模块卸载后保留任何使其无法回收的引用。容器销毁后
//! 所有操作退化为空注册表的语义。

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use crate::loader::types::ClassLoader;
use crate::module::metadata::{ModuleInfo, ModuleState};
use crate::module::registry::{ModuleRegistry, RegistryInner};

/// 注册表只读视图
///
/// 各查询互相独立，不保证跨调用的快照一致性；每次调用反映
/// 调用瞬间的注册表状态，返回值应立即消费。
pub struct RegistryView {
    inner: Weak<RegistryInner>,
}

impl RegistryView {
    /// 基于注册表创建只读视图
    pub fn of(registry: &ModuleRegistry) -> Self {
        Self {
            inner: registry.downgrade(),
        }
    }

    /// 注册表是否仍然可用
    pub fn is_available(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// 注册表的当前变更令牌
    ///
    /// 注册表不可用时返回 `u64::MAX`，保证残留缓存一律视为过期。
    pub fn version(&self) -> u64 {
        self.inner
            .upgrade()
            .map(|inner| inner.version.load(Ordering::Acquire))
            .unwrap_or(u64::MAX)
    }

    /// 当前已注册模块的即时快照（安装顺序）
    ///
    /// 注册表不可用时返回空列表。
    pub async fn modules(&self) -> Vec<ModuleInfo> {
        let Some(inner) = self.inner.upgrade() else {
            return Vec::new();
        };
        let modules = inner.modules.read().await;
        let order = inner.install_order.read().await;
        order
            .iter()
            .filter_map(|id| modules.get(id).map(|e| e.info.clone()))
            .collect()
    }

    /// 模块的当前生命周期状态
    pub async fn state(&self, module_id: &str) -> Option<ModuleState> {
        let inner = self.inner.upgrade()?;
        let modules = inner.modules.read().await;
        modules.get(module_id).map(|e| e.info.state)
    }

    /// 声明导出指定包的模块 ID，按安装顺序、不做状态过滤
    ///
    /// 这个顺序就是类查找的决胜顺序。
    pub async fn exporters_of(&self, package: &str) -> Vec<String> {
        let Some(inner) = self.inner.upgrade() else {
            return Vec::new();
        };
        let modules = inner.modules.read().await;
        let order = inner.install_order.read().await;
        order
            .iter()
            .filter(|id| {
                modules
                    .get(*id)
                    .map(|e| e.info.exports_package(package))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// 模块的内在类加载器（仅供单次查找期间瞬时使用）
    pub async fn loader_of(&self, module_id: &str) -> Option<Arc<dyn ClassLoader>> {
        let inner = self.inner.upgrade()?;
        let modules = inner.modules.read().await;
        modules.get(module_id).map(|e| Arc::clone(&e.loader))
    }
}

impl Clone for RegistryView {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}
