//! 日志系统模块
//!
//! 基于 tracing 生态为动态类加载子系统提供结构化日志，包括：
//!
//! - 多级别日志支持（TRACE, DEBUG, INFO, WARN, ERROR）
//! - 结构化日志（可选 JSON 格式输出）
//! - 文件日志输出（异步非阻塞）
//! - 日志轮转（每天、每小时）
//! - 按模块、按级别过滤（`RUST_LOG` 环境变量）
//!
//! # 示例
//!
//! ```rust,no_run
//! use chips_dynload::{Logger, LoggerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 基础初始化（仅控制台输出）
//!     let _guard = Logger::init(LoggerConfig::default())?;
//!
//!     tracing::info!(
//!         module_id = "commons-util",
//!         class_name = "commons.util.PropertiesUtil",
//!         "类加载成功"
//!     );
//!     Ok(())
//! }
//! ```

use crate::utils::{CoreError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 常用结构化字段名
///
/// 统一日志字段命名，便于日志检索。
pub mod fields {
    /// 模块 ID
    pub const MODULE_ID: &str = "module_id";
    /// 类的全限定名
    pub const CLASS_NAME: &str = "class_name";
    /// 包名
    pub const PACKAGE: &str = "package";
    /// 资源名
    pub const RESOURCE: &str = "resource";
}

// ============================================================================
// 日志轮转策略
// ============================================================================

/// 日志轮转策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStrategy {
    /// 不轮转（单个日志文件）
    Never,
    /// 每小时轮转
    Hourly,
    /// 每天轮转（默认）
    #[default]
    Daily,
}

impl RotationStrategy {
    /// 转换为 tracing-appender 的 Rotation 类型
    fn to_rotation(self) -> Rotation {
        match self {
            RotationStrategy::Never => Rotation::NEVER,
            RotationStrategy::Hourly => Rotation::HOURLY,
            RotationStrategy::Daily => Rotation::DAILY,
        }
    }

    /// 从字符串解析轮转策略，未识别的取默认值
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "never" | "none" => RotationStrategy::Never,
            "hourly" | "hour" => RotationStrategy::Hourly,
            _ => RotationStrategy::Daily,
        }
    }
}

impl std::fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotationStrategy::Never => write!(f, "never"),
            RotationStrategy::Hourly => write!(f, "hourly"),
            RotationStrategy::Daily => write!(f, "daily"),
        }
    }
}

// ============================================================================
// 日志配置
// ============================================================================

/// 日志系统配置
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// 默认日志级别（"trace", "debug", "info", "warn", "error"）
    pub level: String,

    /// 是否输出 JSON 格式
    pub json_format: bool,

    /// 日志文件输出目录（None 表示仅控制台输出）
    pub file_dir: Option<PathBuf>,

    /// 日志文件名前缀
    pub file_prefix: String,

    /// 日志轮转策略
    pub rotation: RotationStrategy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_dir: None,
            file_prefix: "chips-dynload".to_string(),
            rotation: RotationStrategy::Daily,
        }
    }
}

impl LoggerConfig {
    /// 创建配置构建器
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::default()
    }
}

/// 日志配置构建器
#[derive(Debug, Default)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    /// 设置日志级别
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// 启用 JSON 格式输出
    pub fn json_format(mut self, enabled: bool) -> Self {
        self.config.json_format = enabled;
        self
    }

    /// 设置文件输出目录
    pub fn file_output(mut self, dir: PathBuf) -> Self {
        self.config.file_dir = Some(dir);
        self
    }

    /// 设置日志文件名前缀
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    /// 设置轮转策略
    pub fn rotation(mut self, rotation: RotationStrategy) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// 构建配置
    pub fn build(self) -> LoggerConfig {
        self.config
    }
}

// ============================================================================
// 日志系统
// ============================================================================

/// 日志系统守卫
///
/// 持有异步写入线程的守卫，丢弃时会刷新缓冲的日志。
/// 调用方需在进程生命周期内持有此守卫。
pub struct LogGuard {
    _worker_guard: Option<WorkerGuard>,
}

/// 全局初始化标记，日志系统仅允许初始化一次
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// 日志系统入口
pub struct Logger;

impl Logger {
    /// 初始化日志系统
    ///
    /// # Errors
    ///
    /// - 重复初始化
    /// - 日志目录创建失败
    pub fn init(config: LoggerConfig) -> Result<LogGuard> {
        if INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(CoreError::InitFailed("日志系统已初始化".to_string()));
        }

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));

        let worker_guard = match &config.file_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let appender = RollingFileAppender::new(
                    config.rotation.to_rotation(),
                    dir,
                    &config.file_prefix,
                );
                let (writer, guard) = tracing_appender::non_blocking(appender);

                if config.json_format {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stdout))
                        .with(fmt::layer().json().with_ansi(false).with_writer(writer))
                        .try_init()
                        .map_err(|e| CoreError::InitFailed(e.to_string()))?;
                } else {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stdout))
                        .with(fmt::layer().with_ansi(false).with_writer(writer))
                        .try_init()
                        .map_err(|e| CoreError::InitFailed(e.to_string()))?;
                }
                Some(guard)
            }
            None => {
                if config.json_format {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().json().with_writer(std::io::stdout))
                        .try_init()
                        .map_err(|e| CoreError::InitFailed(e.to_string()))?;
                } else {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stdout))
                        .try_init()
                        .map_err(|e| CoreError::InitFailed(e.to_string()))?;
                }
                None
            }
        };

        tracing::debug!(level = %config.level, "日志系统初始化完成");
        Ok(LogGuard {
            _worker_guard: worker_guard,
        })
    }
}
