//! 动态类加载子系统错误类型定义
//!
//! 本模块定义了子系统中使用的所有错误类型。

use thiserror::Error;

/// 动态类加载子系统核心错误类型
#[derive(Error, Debug)]
pub enum CoreError {
    // ==================== 类加载错误 ====================

    /// 类未找到
    ///
    /// 类查找的唯一失败形式：没有任何处于 Active 状态的导出者能解析该类名。
    #[error("类未找到: '{0}'")]
    ClassNotFound(String),

    /// 类链接失败
    ///
    /// 委托加载器在定义类的过程中失败。此错误原样向上传播，
    /// 不会重试其他候选模块。
    #[error("类链接失败: '{class_name}' - {reason}")]
    LinkageFailure {
        class_name: String,
        reason: String,
    },

    // ==================== 模块管理错误 ====================

    /// 模块未找到
    #[error("模块未找到: '{0}'")]
    ModuleNotFound(String),

    /// 模块已安装（ID 冲突）
    #[error("模块已安装: '{0}'")]
    ModuleAlreadyInstalled(String),

    /// 非法的生命周期状态转换
    #[error("模块 '{module_id}' 状态转换非法: {from} -> {to}")]
    InvalidTransition {
        module_id: String,
        from: String,
        to: String,
    },

    /// 无效的模块元数据
    #[error("无效的模块元数据: {0}")]
    InvalidMetadata(String),

    // ==================== 服务注册表错误 ====================

    /// 服务已注册
    #[error("服务已注册: '{0}'")]
    ServiceAlreadyRegistered(String),

    /// 服务未找到
    #[error("服务未找到: '{0}'")]
    ServiceNotFound(String),

    // ==================== IO 和序列化错误 ====================

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML 序列化/反序列化错误
    #[error("YAML 错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ==================== 通用错误 ====================

    /// 初始化失败
    #[error("初始化失败: {0}")]
    InitFailed(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// 其他错误
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// 子系统操作结果类型别名
pub type Result<T> = std::result::Result<T, CoreError>;

/// 错误码常量
pub mod error_code {
    /// 类未找到
    pub const CLASS_NOT_FOUND: &str = "CLASS-001";
    /// 类链接失败
    pub const CLASS_LINKAGE_FAILURE: &str = "CLASS-002";

    /// 模块未找到
    pub const MODULE_NOT_FOUND: &str = "MODULE-001";
    /// 模块已安装
    pub const MODULE_ALREADY_INSTALLED: &str = "MODULE-002";
    /// 非法的生命周期状态转换
    pub const MODULE_INVALID_TRANSITION: &str = "MODULE-003";
    /// 无效的模块元数据
    pub const MODULE_INVALID_METADATA: &str = "MODULE-004";

    /// 服务已注册
    pub const SERVICE_ALREADY_REGISTERED: &str = "SERVICE-001";
    /// 服务未找到
    pub const SERVICE_NOT_FOUND: &str = "SERVICE-002";

    /// 初始化失败
    pub const CORE_INIT_FAILED: &str = "CORE-001";
}

impl CoreError {
    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::ClassNotFound(_) => error_code::CLASS_NOT_FOUND,
            CoreError::LinkageFailure { .. } => error_code::CLASS_LINKAGE_FAILURE,
            CoreError::ModuleNotFound(_) => error_code::MODULE_NOT_FOUND,
            CoreError::ModuleAlreadyInstalled(_) => error_code::MODULE_ALREADY_INSTALLED,
            CoreError::InvalidTransition { .. } => error_code::MODULE_INVALID_TRANSITION,
            CoreError::InvalidMetadata(_) => error_code::MODULE_INVALID_METADATA,
            CoreError::ServiceAlreadyRegistered(_) => error_code::SERVICE_ALREADY_REGISTERED,
            CoreError::ServiceNotFound(_) => error_code::SERVICE_NOT_FOUND,
            CoreError::InitFailed(_) => error_code::CORE_INIT_FAILED,
            _ => "UNKNOWN",
        }
    }

    /// 是否为"类未找到"错误
    ///
    /// 动态类加载器依赖此判断决定是继续尝试下一个候选模块
    /// 还是原样传播错误。
    pub fn is_class_not_found(&self) -> bool {
        matches!(self, CoreError::ClassNotFound(_))
    }
}
