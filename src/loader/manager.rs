//! 动态类加载器管理器
//!
//! 管理器是动态类加载子系统的入口服务：激活时创建唯一的动态类
//! 加载器并订阅注册表事件，停用时将加载器标记为失效。加载器的
//! 对象身份在管理器整个生命周期内保持稳定，调用方可以长期持有。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::config::LoaderConfig;
use crate::loader::dynamic::DynamicClassLoader;
use crate::loader::view::RegistryView;
use crate::module::registry::ModuleRegistry;

/// 管理器在服务注册表中的名称
pub const SERVICE_NAME: &str = "DynamicClassLoaderManager";

/// 管理器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerState {
    /// 激活中
    Starting,
    /// 运行中
    Running,
    /// 已停用（终态）
    Stopped,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManagerState::Starting => "starting",
            ManagerState::Running => "running",
            ManagerState::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// 动态类加载器管理器
///
/// 通过 [`activate`](DynamicClassLoaderManager::activate) 创建并启动，
/// 停用后不可重新激活；新的激活会产生新的管理器与新的加载器身份。
pub struct DynamicClassLoaderManager {
    /// 唯一的动态类加载器（身份稳定）
    loader: Arc<DynamicClassLoader>,

    /// 管理器状态
    state: RwLock<ManagerState>,

    /// 事件分发任务句柄
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl DynamicClassLoaderManager {
    /// 激活管理器
    ///
    /// 创建动态类加载器、订阅注册表生命周期事件并启动事件分发任务。
    /// 返回时管理器已处于 Running 状态。
    pub async fn activate(registry: &ModuleRegistry, config: &LoaderConfig) -> Arc<Self> {
        let parent = config.parent_loader.build();
        let view = RegistryView::of(registry);
        let loader = Arc::new(DynamicClassLoader::new(
            parent,
            view,
            config.resolve_disabled_packages(),
            config.exporter_cache_size,
        ));

        let manager = Arc::new(Self {
            loader: Arc::clone(&loader),
            state: RwLock::new(ManagerState::Starting),
            event_task: Mutex::new(None),
        });

        let rx = registry.subscribe();
        let handle = tokio::spawn(Self::dispatch_events(rx, loader));
        *manager.event_task.lock().await = Some(handle);
        *manager.state.write().await = ManagerState::Running;

        info!("动态类加载器管理器已激活");
        manager
    }

    /// 事件分发循环：每个注册表事件后使导出者缓存失效
    async fn dispatch_events(
        mut rx: broadcast::Receiver<crate::module::registry::ModuleEvent>,
        loader: Arc<DynamicClassLoader>,
    ) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    debug!(
                        module_id = %event.module_id,
                        state = %event.state,
                        "收到模块生命周期事件"
                    );
                    loader.invalidate().await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "事件通道滞后，整体失效缓存");
                    loader.invalidate().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// 获取动态类加载器
    ///
    /// 每次调用返回同一个对象；管理器停用后仍返回它，但其查找
    /// 一律以 ClassNotFound 失败。
    pub fn class_loader(&self) -> Arc<DynamicClassLoader> {
        Arc::clone(&self.loader)
    }

    /// 管理器当前状态
    pub async fn state(&self) -> ManagerState {
        *self.state.read().await
    }

    /// 管理器是否在运行
    pub async fn is_running(&self) -> bool {
        self.state().await == ManagerState::Running
    }

    /// 停用管理器
    ///
    /// 将加载器标记为失效并终止事件分发任务。幂等，不可逆。
    pub async fn deactivate(&self) {
        {
            let mut state = self.state.write().await;
            if *state == ManagerState::Stopped {
                return;
            }
            *state = ManagerState::Stopped;
        }

        self.loader.mark_defunct();

        if let Some(handle) = self.event_task.lock().await.take() {
            handle.abort();
        }

        info!("动态类加载器管理器已停用");
    }
}
