//! 子系统配置
//!
//! 定义动态类加载子系统的配置结构和加载逻辑。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::loader::system::SystemClassLoader;
use crate::loader::types::ClassLoader;
use crate::utils::logger::{LoggerConfig, RotationStrategy};

/// 委托父加载器选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentLoaderSelector {
    /// 带内置平台类集合的系统加载器（默认）
    #[default]
    Platform,
    /// 空的系统加载器（所有查找都落到动态部分）
    Empty,
}

impl ParentLoaderSelector {
    /// 构建对应的父加载器实例
    pub(crate) fn build(&self) -> Arc<dyn ClassLoader> {
        match self {
            ParentLoaderSelector::Platform => Arc::new(SystemClassLoader::with_platform()),
            ParentLoaderSelector::Empty => Arc::new(SystemClassLoader::new()),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件目录
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 日志轮转策略
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_dir: None,
            json_format: false,
            rotation: default_rotation(),
        }
    }
}

impl LogConfig {
    /// 转换为日志系统配置
    pub fn to_logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            level: self.level.clone(),
            json_format: self.json_format,
            file_dir: if self.file_output {
                self.log_dir.clone()
            } else {
                None
            },
            file_prefix: "chips-dynload".to_string(),
            rotation: RotationStrategy::parse(&self.rotation),
        }
    }
}

/// 动态类加载子系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// 配置文件路径
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// 委托父加载器
    #[serde(default)]
    pub parent_loader: ParentLoaderSelector,

    /// 排除在动态解析之外的包前缀
    #[serde(default)]
    pub disabled_packages: Vec<String>,

    /// 按包导出者缓存的容量
    #[serde(default = "default_exporter_cache_size")]
    pub exporter_cache_size: usize,

    /// 日志配置
    #[serde(default)]
    pub logging: LogConfig,
}

fn default_exporter_cache_size() -> usize {
    128
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            parent_loader: ParentLoaderSelector::default(),
            disabled_packages: vec![],
            exporter_cache_size: default_exporter_cache_size(),
            logging: LogConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// 创建配置构建器
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::new()
    }

    /// 从文件加载配置
    pub async fn from_file(path: impl Into<PathBuf>) -> crate::utils::Result<Self> {
        let path = path.into();
        let content = tokio::fs::read_to_string(&path).await?;

        let mut config: LoaderConfig = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.config_path = Some(path);
        Ok(config)
    }

    /// 规范化后的排除包前缀
    ///
    /// 去除首尾空白和末尾的 `.`，丢弃空项并去重，保持声明顺序。
    pub fn resolve_disabled_packages(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.disabled_packages
            .iter()
            .map(|p| p.trim().trim_end_matches('.').to_string())
            .filter(|p| !p.is_empty())
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }
}

/// 配置构建器
#[derive(Debug, Default)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    /// 设置委托父加载器
    pub fn parent_loader(mut self, selector: ParentLoaderSelector) -> Self {
        self.config.parent_loader = selector;
        self
    }

    /// 追加排除包前缀
    pub fn disable_package(mut self, package: impl Into<String>) -> Self {
        self.config.disabled_packages.push(package.into());
        self
    }

    /// 设置导出者缓存容量
    pub fn exporter_cache_size(mut self, size: usize) -> Self {
        self.config.exporter_cache_size = size;
        self
    }

    /// 设置日志级别
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// 启用文件日志
    pub fn file_logging(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.config.logging.file_output = true;
        self.config.logging.log_dir = Some(log_dir.into());
        self
    }

    /// 启用 JSON 格式日志
    pub fn json_logging(mut self) -> Self {
        self.config.logging.json_format = true;
        self
    }

    /// 构建配置
    pub fn build(self) -> LoaderConfig {
        self.config
    }
}
