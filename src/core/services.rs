//! 服务注册表
//!
//! 容器内的按名服务查找：组件把共享对象按服务名注册进来，
//! 调用方按名取出并向下转型到具体类型。动态类加载器管理器
//! 就是通过这里对外发布的。

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::utils::{CoreError, Result};

/// 服务注册表
///
/// `Clone` 共享同一份底层数据，所有操作可从任意任务并发调用。
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: Arc<RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>>,
}

impl ServiceRegistry {
    /// 创建新的服务注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册服务
    ///
    /// # Errors
    ///
    /// 同名服务已注册时返回错误。
    pub async fn register<T>(&self, name: impl Into<String>, service: Arc<T>) -> Result<()>
    where
        T: Any + Send + Sync,
    {
        let name = name.into();
        let mut services = self.services.write().await;
        if services.contains_key(&name) {
            return Err(CoreError::ServiceAlreadyRegistered(name));
        }
        services.insert(name.clone(), service);
        info!(service = %name, "服务已注册");
        Ok(())
    }

    /// 按名查找服务并向下转型
    ///
    /// 服务不存在或类型不匹配时返回 `None`。
    pub async fn lookup<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let services = self.services.read().await;
        services
            .get(name)
            .cloned()
            .and_then(|s| s.downcast::<T>().ok())
    }

    /// 注销服务
    ///
    /// # Errors
    ///
    /// 服务不存在时返回错误。
    pub async fn unregister(&self, name: &str) -> Result<()> {
        let mut services = self.services.write().await;
        if services.remove(name).is_none() {
            return Err(CoreError::ServiceNotFound(name.to_string()));
        }
        debug!(service = %name, "服务已注销");
        Ok(())
    }

    /// 服务是否已注册
    pub async fn contains(&self, name: &str) -> bool {
        let services = self.services.read().await;
        services.contains_key(name)
    }

    /// 已注册服务数量
    pub async fn count(&self) -> usize {
        let services = self.services.read().await;
        services.len()
    }

    /// 已注册服务名列表
    pub async fn list_services(&self) -> Vec<String> {
        let services = self.services.read().await;
        services.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DemoService {
        value: u32,
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = ServiceRegistry::new();
        registry
            .register("demo", Arc::new(DemoService { value: 42 }))
            .await
            .unwrap();

        let service = registry.lookup::<DemoService>("demo").await.unwrap();
        assert_eq!(service.value, 42);
        assert!(registry.contains("demo").await);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let registry = ServiceRegistry::new();
        registry
            .register("demo", Arc::new(DemoService { value: 1 }))
            .await
            .unwrap();

        let result = registry
            .register("demo", Arc::new(DemoService { value: 2 }))
            .await;
        assert!(matches!(
            result.unwrap_err(),
            CoreError::ServiceAlreadyRegistered(_)
        ));
    }

    #[tokio::test]
    async fn test_lookup_wrong_type() {
        let registry = ServiceRegistry::new();
        registry
            .register("demo", Arc::new(DemoService { value: 1 }))
            .await
            .unwrap();

        assert!(registry.lookup::<String>("demo").await.is_none());
        assert!(registry.lookup::<DemoService>("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = ServiceRegistry::new();
        registry
            .register("demo", Arc::new(DemoService { value: 1 }))
            .await
            .unwrap();

        registry.unregister("demo").await.unwrap();
        assert!(!registry.contains("demo").await);
        assert!(matches!(
            registry.unregister("demo").await.unwrap_err(),
            CoreError::ServiceNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let registry = ServiceRegistry::new();
        let cloned = registry.clone();

        registry
            .register("demo", Arc::new(DemoService { value: 7 }))
            .await
            .unwrap();
        assert!(cloned.lookup::<DemoService>("demo").await.is_some());
    }
}
