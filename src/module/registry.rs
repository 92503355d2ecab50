//! 模块注册表
//!
//! 容器侧的活动注册表：持有当前已安装的模块、驱动生命周期状态转换、
//! 并在每次转换时广播事件。动态类加载器一侧只通过只读视图
//! [`RegistryView`](crate::loader::RegistryView) 访问这里的数据。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::loader::types::ClassLoader;
use crate::module::metadata::{ModuleInfo, ModuleMetadata, ModuleState};
use crate::utils::{CoreError, Result};

/// 事件通道容量
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 模块生命周期事件
///
/// 载荷为模块标识与新状态，对应每一次可能改变 Active 集合成员的转换。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEvent {
    /// 模块 ID
    pub module_id: String,

    /// 转换后的新状态
    pub state: ModuleState,
}

/// 注册表条目：模块信息 + 内在加载器
pub(crate) struct ModuleEntry {
    pub(crate) info: ModuleInfo,
    pub(crate) loader: Arc<dyn ClassLoader>,
}

/// 注册表共享内部状态
///
/// 单独成类型是为了让只读视图持有 `Weak` 引用：容器销毁后视图
/// 自动退化为空注册表。
pub(crate) struct RegistryInner {
    /// 已安装的模块：module_id -> ModuleEntry
    pub(crate) modules: RwLock<HashMap<String, ModuleEntry>>,

    /// 安装顺序（注册表的自然顺序，候选选择的决胜顺序）
    pub(crate) install_order: RwLock<Vec<String>>,

    /// 生命周期事件广播
    pub(crate) events: broadcast::Sender<ModuleEvent>,

    /// 变更令牌：每次安装、状态转换、卸载都会推进
    ///
    /// 读取方以令牌判断缓存的派生数据（如按包的导出者列表）是否过期。
    pub(crate) version: AtomicU64,
}

/// 模块注册表
///
/// 所有操作都可以从任意任务并发调用。`Clone` 共享同一份底层数据。
pub struct ModuleRegistry {
    inner: Arc<RegistryInner>,
}

impl ModuleRegistry {
    /// 创建新的模块注册表
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RegistryInner {
                modules: RwLock::new(HashMap::new()),
                install_order: RwLock::new(Vec::new()),
                events,
                version: AtomicU64::new(0),
            }),
        }
    }

    /// 订阅生命周期事件
    pub fn subscribe(&self) -> broadcast::Receiver<ModuleEvent> {
        self.inner.events.subscribe()
    }

    /// 获取共享内部状态的弱引用（只读视图使用）
    pub(crate) fn downgrade(&self) -> std::sync::Weak<RegistryInner> {
        Arc::downgrade(&self.inner)
    }

    /// 安装模块
    ///
    /// 模块以 Installed 状态进入注册表，携带其内在类加载器。
    ///
    /// # Errors
    ///
    /// - 元数据无效
    /// - 模块已安装（ID 冲突）
    pub async fn install(
        &self,
        metadata: ModuleMetadata,
        loader: Arc<dyn ClassLoader>,
    ) -> Result<String> {
        if let Err(errors) = metadata.validate() {
            return Err(CoreError::InvalidMetadata(errors.join("; ")));
        }
        let module_id = metadata.id.clone();

        {
            let mut modules = self.inner.modules.write().await;
            if modules.contains_key(&module_id) {
                return Err(CoreError::ModuleAlreadyInstalled(module_id));
            }

            let mut order = self.inner.install_order.write().await;
            modules.insert(
                module_id.clone(),
                ModuleEntry {
                    info: ModuleInfo::new(metadata),
                    loader,
                },
            );
            order.push(module_id.clone());
        }

        info!(module_id = %module_id, "模块已安装");
        self.emit(&module_id, ModuleState::Installed);
        Ok(module_id)
    }

    /// 布线模块（Installed -> Resolved）
    ///
    /// 对应容器计算依赖布线的步骤。已处于 Resolved 状态时幂等返回。
    pub async fn resolve(&self, module_id: &str) -> Result<()> {
        {
            let mut modules = self.inner.modules.write().await;
            let entry = modules
                .get_mut(module_id)
                .ok_or_else(|| CoreError::ModuleNotFound(module_id.to_string()))?;

            match entry.info.state {
                ModuleState::Resolved => {
                    warn!(module_id = %module_id, "模块已布线");
                    return Ok(());
                }
                state if state.can_resolve() => {
                    entry.info.state = ModuleState::Resolved;
                    entry.info.resolved_at = Some(Utc::now());
                }
                state => {
                    return Err(CoreError::InvalidTransition {
                        module_id: module_id.to_string(),
                        from: state.to_string(),
                        to: ModuleState::Resolved.to_string(),
                    });
                }
            }
        }

        debug!(module_id = %module_id, "模块已布线");
        self.emit(module_id, ModuleState::Resolved);
        Ok(())
    }

    /// 启动模块（-> Active）
    ///
    /// 从 Installed 状态启动会先隐式布线。已处于 Active 状态时幂等返回。
    pub async fn start(&self, module_id: &str) -> Result<()> {
        let implicit_resolve;
        {
            let mut modules = self.inner.modules.write().await;
            let entry = modules
                .get_mut(module_id)
                .ok_or_else(|| CoreError::ModuleNotFound(module_id.to_string()))?;

            match entry.info.state {
                ModuleState::Active => {
                    warn!(module_id = %module_id, "模块已在运行中");
                    return Ok(());
                }
                state if state.can_start() => {
                    implicit_resolve = state == ModuleState::Installed;
                    if implicit_resolve {
                        entry.info.resolved_at = Some(Utc::now());
                    }
                    entry.info.state = ModuleState::Active;
                    entry.info.started_at = Some(Utc::now());
                }
                state => {
                    return Err(CoreError::InvalidTransition {
                        module_id: module_id.to_string(),
                        from: state.to_string(),
                        to: ModuleState::Active.to_string(),
                    });
                }
            }
        }

        if implicit_resolve {
            self.emit(module_id, ModuleState::Resolved);
        }
        info!(module_id = %module_id, "模块已启动");
        self.emit(module_id, ModuleState::Active);
        Ok(())
    }

    /// 停止模块（Active -> Stopping -> Resolved）
    ///
    /// 模块停止后回到 Resolved 状态：布线仍然有效，但不再参与动态类解析。
    /// 模块本就未运行时幂等返回。
    pub async fn stop(&self, module_id: &str) -> Result<()> {
        {
            let mut modules = self.inner.modules.write().await;
            let entry = modules
                .get_mut(module_id)
                .ok_or_else(|| CoreError::ModuleNotFound(module_id.to_string()))?;

            match entry.info.state {
                ModuleState::Installed | ModuleState::Resolved => {
                    warn!(module_id = %module_id, "模块未在运行");
                    return Ok(());
                }
                state if state.can_stop() => {
                    entry.info.state = ModuleState::Stopping;
                }
                state => {
                    return Err(CoreError::InvalidTransition {
                        module_id: module_id.to_string(),
                        from: state.to_string(),
                        to: ModuleState::Stopping.to_string(),
                    });
                }
            }
        }
        self.emit(module_id, ModuleState::Stopping);

        {
            let mut modules = self.inner.modules.write().await;
            if let Some(entry) = modules.get_mut(module_id) {
                entry.info.state = ModuleState::Resolved;
            }
        }

        info!(module_id = %module_id, "模块已停止");
        self.emit(module_id, ModuleState::Resolved);
        Ok(())
    }

    /// 卸载模块（-> Uninstalled，并从注册表移除）
    ///
    /// 运行中的模块会先走停止流程。卸载后注册表不保留任何对该模块
    /// 及其内在加载器的引用。
    pub async fn uninstall(&self, module_id: &str) -> Result<()> {
        let was_active = match self.get_state(module_id).await {
            Some(state) if state.can_uninstall() => state == ModuleState::Active,
            Some(state) => {
                return Err(CoreError::InvalidTransition {
                    module_id: module_id.to_string(),
                    from: state.to_string(),
                    to: ModuleState::Uninstalled.to_string(),
                });
            }
            None => return Err(CoreError::ModuleNotFound(module_id.to_string())),
        };

        if was_active {
            self.stop(module_id).await?;
        }

        {
            let mut modules = self.inner.modules.write().await;
            let mut order = self.inner.install_order.write().await;
            modules.remove(module_id);
            order.retain(|id| id != module_id);
        }

        info!(module_id = %module_id, "模块已卸载");
        self.emit(module_id, ModuleState::Uninstalled);
        Ok(())
    }

    /// 获取模块信息
    pub async fn get_module(&self, module_id: &str) -> Option<ModuleInfo> {
        let modules = self.inner.modules.read().await;
        modules.get(module_id).map(|e| e.info.clone())
    }

    /// 获取模块当前状态
    pub async fn get_state(&self, module_id: &str) -> Option<ModuleState> {
        let modules = self.inner.modules.read().await;
        modules.get(module_id).map(|e| e.info.state)
    }

    /// 按安装顺序列出所有模块
    pub async fn list_modules(&self) -> Vec<ModuleInfo> {
        let modules = self.inner.modules.read().await;
        let order = self.inner.install_order.read().await;
        order
            .iter()
            .filter_map(|id| modules.get(id).map(|e| e.info.clone()))
            .collect()
    }

    /// 按安装顺序返回声明导出指定包的模块 ID（不做状态过滤）
    pub async fn exporters_of(&self, package: &str) -> Vec<String> {
        let modules = self.inner.modules.read().await;
        let order = self.inner.install_order.read().await;
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

    /// 获取模块的内在类加载器
    pub async fn loader_of(&self, module_id: &str) -> Option<Arc<dyn ClassLoader>> {
        let modules = self.inner.modules.read().await;
        modules.get(module_id).map(|e| Arc::clone(&e.loader))
    }

    /// 检查模块是否存在
    pub async fn exists(&self, module_id: &str) -> bool {
        let modules = self.inner.modules.read().await;
        modules.contains_key(module_id)
    }

    /// 已安装模块数量
    pub async fn count(&self) -> usize {
        let modules = self.inner.modules.read().await;
        modules.len()
    }

    /// 当前变更令牌
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// 推进变更令牌并广播生命周期事件（无订阅者时静默丢弃）
    fn emit(&self, module_id: &str, state: ModuleState) {
        self.inner.version.fetch_add(1, Ordering::Release);
        let _ = self.inner.events.send(ModuleEvent {
            module_id: module_id.to_string(),
            state,
        });
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ModuleRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
