//! 动态类加载器
//!
//! 对外呈现单一稳定身份的类加载器，其可达命名空间是当前注册表中
//! 所有可解析类的并集。每次查找按"父加载器优先，再按安装顺序遍历
//! Active 导出者"的策略即时计算委托集合；注册表变动通过失效令牌
//! 使按包缓存的导出者列表过期。

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::loader::types::{
    package_of, package_of_resource, ClassLoader, LoadedClass, Resource,
};
use crate::loader::view::RegistryView;
use crate::utils::{CoreError, Result};

use async_trait::async_trait;

/// 缓存的导出者列表，附带获取时的注册表失效令牌
struct CachedExporters {
    token: u64,
    module_ids: Vec<String>,
}

/// 动态类加载器
///
/// 由管理器持有的进程级共享对象。构造后除失效标记与内部缓存外不可变，
/// 查找期间不持有任何跨委托调用的长锁。卸载后的模块不会被本加载器
/// 以任何阻止回收的方式引用：缓存只存模块 ID，加载器引用仅在单次
/// 查找期间瞬时持有。
pub struct DynamicClassLoader {
    /// 委托父加载器（容器系统加载器）
    parent: Arc<dyn ClassLoader>,

    /// 注册表只读视图
    view: RegistryView,

    /// 失效标记：管理器停止后为 true，终态
    defunct: AtomicBool,

    /// 排除在动态解析之外的包前缀
    disabled_packages: Vec<String>,

    /// 按包缓存的导出者列表（单写者：事件分发任务；读者任意）
    exporter_cache: Mutex<LruCache<String, CachedExporters>>,
}

impl DynamicClassLoader {
    /// 创建动态类加载器（仅由管理器调用）
    pub(crate) fn new(
        parent: Arc<dyn ClassLoader>,
        view: RegistryView,
        disabled_packages: Vec<String>,
        cache_size: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            parent,
            view,
            defunct: AtomicBool::new(false),
            disabled_packages,
            exporter_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// 委托父加载器（getParent 的对应物）
    pub fn parent(&self) -> &Arc<dyn ClassLoader> {
        &self.parent
    }

    /// 加载器是否已失效
    pub fn is_defunct(&self) -> bool {
        self.defunct.load(Ordering::Acquire)
    }

    /// 标记加载器失效（live -> defunct，终态，仅由管理器停止触发）
    pub(crate) fn mark_defunct(&self) {
        self.defunct.store(true, Ordering::Release);
    }

    /// 清空导出者缓存（事件分发任务在每个注册表事件后调用）
    pub(crate) async fn invalidate(&self) {
        let mut cache = self.exporter_cache.lock().await;
        cache.clear();
        trace!("导出者缓存已清空");
    }

    /// 包是否被配置排除在动态解析之外
    fn package_disabled(&self, package: &str) -> bool {
        self.disabled_packages
            .iter()
            .any(|prefix| package == prefix || package.starts_with(&format!("{}.", prefix)))
    }

    /// 获取包的候选导出者（安装顺序）
    ///
    /// 以注册表的变更令牌判断缓存新鲜度：任何安装/状态变更/卸载都会
    /// 推进令牌，使旧缓存在下一次查找时重新查询。状态过滤不在此处，
    /// 每个候选在使用时读取其当下状态。
    async fn candidates(&self, package: &str) -> Vec<String> {
        let token = self.view.version();

        {
            let mut cache = self.exporter_cache.lock().await;
            if let Some(cached) = cache.get(package) {
                if cached.token == token {
                    return cached.module_ids.clone();
                }
            }
        }

        let module_ids = self.view.exporters_of(package).await;
        let mut cache = self.exporter_cache.lock().await;
        cache.put(
            package.to_string(),
            CachedExporters {
                token,
                module_ids: module_ids.clone(),
            },
        );
        module_ids
    }

    /// 查找单个资源并返回其内容（getResourceAsStream 的对应物）
    pub async fn resource_bytes(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        self.resource(name).await.map(|r| r.bytes)
    }
}

#[async_trait]
impl ClassLoader for DynamicClassLoader {
    /// 加载类
    ///
    /// 算法：
    /// 1. 已失效则立即以 ClassNotFound 失败
    /// 2. 先委托父加载器；父加载器命中直接返回，保证平台类不被模块遮蔽
    /// 3. 按安装顺序遍历包的导出者，只询问当下处于 Active 状态的模块
    /// 4. 候选返回 ClassNotFound 则尝试下一个；其余错误（链接失败等）
    ///    原样传播，不再重试
    /// 5. 候选耗尽则以 ClassNotFound 失败
    async fn load_class(&self, name: &str) -> Result<LoadedClass> {
        if self.is_defunct() {
            warn!(class_name = %name, "管理器已停止，动态类加载器拒绝查找");
            return Err(CoreError::ClassNotFound(format!(
                "{} (动态类加载器管理器已停止)",
                name
            )));
        }

        let package = package_of(name);

        match self.parent.load_class(name).await {
            Ok(class) => {
                trace!(class_name = %name, "父加载器命中");
                return Ok(class);
            }
            Err(e) if e.is_class_not_found() => {}
            Err(e) => return Err(e),
        }

        if self.package_disabled(package) {
            debug!(class_name = %name, package = %package, "包被排除在动态解析之外");
            return Err(CoreError::ClassNotFound(name.to_string()));
        }

        for module_id in self.candidates(package).await {
            let resolvable = self
                .view
                .state(&module_id)
                .await
                .map(|s| s.is_class_resolvable())
                .unwrap_or(false);
            if !resolvable {
                continue;
            }

            let Some(loader) = self.view.loader_of(&module_id).await else {
                continue;
            };
            match loader.load_class(name).await {
                Ok(class) => {
                    debug!(
                        class_name = %name,
                        module_id = %module_id,
                        "动态类解析成功"
                    );
                    return Ok(class);
                }
                Err(e) if e.is_class_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::ClassNotFound(name.to_string()))
    }

    /// 查找单个资源
    ///
    /// 候选选择策略与类查找一致（包名由资源目录推导），返回首个命中；
    /// 已失效时返回 `None`。
    async fn resource(&self, name: &str) -> Option<Resource> {
        if self.is_defunct() {
            return None;
        }

        if let Some(res) = self.parent.resource(name).await {
            return Some(res);
        }

        let package = package_of_resource(name);
        if self.package_disabled(&package) {
            return None;
        }

        for module_id in self.candidates(&package).await {
            let resolvable = self
                .view
                .state(&module_id)
                .await
                .map(|s| s.is_class_resolvable())
                .unwrap_or(false);
            if !resolvable {
                continue;
            }
            if let Some(loader) = self.view.loader_of(&module_id).await {
                if let Some(res) = loader.resource(name).await {
                    return Some(res);
                }
            }
        }
        None
    }

    /// 查找所有同名资源
    ///
    /// 父加载器的命中在前，之后按候选顺序拼接；已失效时返回空集合。
    async fn resources(&self, name: &str) -> Vec<Resource> {
        if self.is_defunct() {
            return Vec::new();
        }

        let mut results = self.parent.resources(name).await;

        let package = package_of_resource(name);
        if self.package_disabled(&package) {
            return results;
        }

        for module_id in self.candidates(&package).await {
            let resolvable = self
                .view
                .state(&module_id)
                .await
                .map(|s| s.is_class_resolvable())
                .unwrap_or(false);
            if !resolvable {
                continue;
            }
            if let Some(loader) = self.view.loader_of(&module_id).await {
                results.extend(loader.resources(name).await);
            }
        }
        results
    }
}
