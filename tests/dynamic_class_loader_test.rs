//! 动态类加载端到端测试
//!
//! 覆盖从模块安装到类可解析的完整生命周期路径，以及加载器
//! 对外身份的稳定性。

use chips_dynload::{
    ClassLoader, DynamicClassLoaderManager, LoaderConfig, ModuleClassLoader, ModuleMetadata,
    ModuleRegistry, ModuleState, ServiceRegistry, SERVICE_NAME, SYSTEM_LOADER_ID,
};
use std::sync::Arc;

const CLASS_NAME: &str = "commons.util.PropertiesUtil";

fn commons_metadata() -> ModuleMetadata {
    ModuleMetadata::new("commons-util", "Commons Util", "2.1.0")
        .with_export("commons.util")
        .with_export("commons.text")
}

fn commons_loader() -> Arc<ModuleClassLoader> {
    Arc::new(
        ModuleClassLoader::new("commons-util")
            .with_class(CLASS_NAME)
            .with_class("commons.text.Formatter")
            .with_resource("commons/util/defaults.properties", b"a=1".to_vec()),
    )
}

/// 完整生命周期步行：Installed 和 Resolved 都不可解析，Active 可解析，
/// 停止后恢复不可解析。
#[tokio::test]
async fn test_full_lifecycle_walk() {
    let registry = ModuleRegistry::new();
    let services = ServiceRegistry::new();
    let manager = DynamicClassLoaderManager::activate(&registry, &LoaderConfig::default()).await;
    services
        .register(SERVICE_NAME, Arc::clone(&manager))
        .await
        .unwrap();

    // 通过服务注册表取得管理器，再取得加载器
    let manager = services
        .lookup::<DynamicClassLoaderManager>(SERVICE_NAME)
        .await
        .unwrap();
    let loader = manager.class_loader();

    // 安装：Installed 状态不可解析
    registry
        .install(commons_metadata(), commons_loader())
        .await
        .unwrap();
    assert_eq!(
        registry.get_state("commons-util").await,
        Some(ModuleState::Installed)
    );
    assert!(loader.load_class(CLASS_NAME).await.is_err());

    // 布线：Resolved 状态仍不可解析
    registry.resolve("commons-util").await.unwrap();
    assert_eq!(
        registry.get_state("commons-util").await,
        Some(ModuleState::Resolved)
    );
    assert!(loader.load_class(CLASS_NAME).await.is_err());

    // 启动：Active 状态可解析，定义加载器是模块的内在加载器
    registry.start("commons-util").await.unwrap();
    let class = loader.load_class(CLASS_NAME).await.unwrap();
    assert_eq!(class.name, CLASS_NAME);
    assert_eq!(class.package, "commons.util");
    assert_eq!(class.defined_by, "commons-util");

    // 同模块的第二个导出包也可解析
    let class = loader.load_class("commons.text.Formatter").await.unwrap();
    assert_eq!(class.defined_by, "commons-util");

    // 停止：回到 Resolved，恢复不可解析
    registry.stop("commons-util").await.unwrap();
    assert_eq!(
        registry.get_state("commons-util").await,
        Some(ModuleState::Resolved)
    );
    assert!(loader.load_class(CLASS_NAME).await.is_err());
}

/// 加载器对外身份在注册表变动之间保持稳定。
#[tokio::test]
async fn test_loader_identity_stable_across_changes() {
    let registry = ModuleRegistry::new();
    let manager = DynamicClassLoaderManager::activate(&registry, &LoaderConfig::default()).await;

    let before = manager.class_loader();
    registry
        .install(commons_metadata(), commons_loader())
        .await
        .unwrap();
    registry.start("commons-util").await.unwrap();
    registry.stop("commons-util").await.unwrap();
    registry.uninstall("commons-util").await.unwrap();
    let after = manager.class_loader();

    assert!(Arc::ptr_eq(&before, &after));
}

/// 父加载器委托：平台类由系统加载器定义，未导出的包不走动态解析。
#[tokio::test]
async fn test_parent_delegation() {
    let registry = ModuleRegistry::new();
    let manager = DynamicClassLoaderManager::activate(&registry, &LoaderConfig::default()).await;
    let loader = manager.class_loader();

    let class = loader.load_class("sys.lang.Text").await.unwrap();
    assert_eq!(class.defined_by, SYSTEM_LOADER_ID);

    // 没有任何模块导出该包
    assert!(loader.load_class("vendor.sdk.Client").await.is_err());
}

/// 模块卸载后其类立即不可解析，注册表不保留模块引用。
#[tokio::test]
async fn test_uninstall_revokes_classes() {
    let registry = ModuleRegistry::new();
    let manager = DynamicClassLoaderManager::activate(&registry, &LoaderConfig::default()).await;
    let loader = manager.class_loader();

    registry
        .install(commons_metadata(), commons_loader())
        .await
        .unwrap();
    registry.start("commons-util").await.unwrap();
    assert!(loader.load_class(CLASS_NAME).await.is_ok());

    registry.uninstall("commons-util").await.unwrap();
    assert!(!registry.exists("commons-util").await);
    assert!(loader.load_class(CLASS_NAME).await.is_err());

    // 同名模块可重新安装并启动
    registry
        .install(commons_metadata(), commons_loader())
        .await
        .unwrap();
    registry.start("commons-util").await.unwrap();
    assert!(loader.load_class(CLASS_NAME).await.is_ok());
}

/// 管理器停用后加载器失效，查找一律失败。
#[tokio::test]
async fn test_deactivation_makes_loader_defunct() {
    let registry = ModuleRegistry::new();
    let services = ServiceRegistry::new();
    let manager = DynamicClassLoaderManager::activate(&registry, &LoaderConfig::default()).await;
    services
        .register(SERVICE_NAME, Arc::clone(&manager))
        .await
        .unwrap();

    registry
        .install(commons_metadata(), commons_loader())
        .await
        .unwrap();
    registry.start("commons-util").await.unwrap();

    let loader = manager.class_loader();
    assert!(loader.load_class(CLASS_NAME).await.is_ok());

    manager.deactivate().await;
    services.unregister(SERVICE_NAME).await.unwrap();

    // 调用方仍持有旧加载器引用，但查找失败且错误说明管理器已停止
    let err = loader.load_class(CLASS_NAME).await.unwrap_err();
    assert!(err.is_class_not_found());
    assert!(err.to_string().contains("已停止"));

    // 模块本身不受影响，新管理器可以接管
    let manager = DynamicClassLoaderManager::activate(&registry, &LoaderConfig::default()).await;
    let fresh = manager.class_loader();
    assert!(!Arc::ptr_eq(&loader, &fresh));
    assert!(fresh.load_class(CLASS_NAME).await.is_ok());
}

/// 资源查找与类查找遵循同一可见性规则。
#[tokio::test]
async fn test_resource_visibility() {
    let registry = ModuleRegistry::new();
    let manager = DynamicClassLoaderManager::activate(&registry, &LoaderConfig::default()).await;
    let loader = manager.class_loader();

    registry
        .install(commons_metadata(), commons_loader())
        .await
        .unwrap();
    assert!(loader
        .resource("commons/util/defaults.properties")
        .await
        .is_none());

    registry.start("commons-util").await.unwrap();
    let res = loader
        .resource("commons/util/defaults.properties")
        .await
        .unwrap();
    assert_eq!(res.source, "commons-util");
    assert_eq!(res.bytes(), b"a=1");

    let bytes = loader
        .resource_bytes("commons/util/defaults.properties")
        .await
        .unwrap();
    assert_eq!(bytes.as_slice(), b"a=1");
}
