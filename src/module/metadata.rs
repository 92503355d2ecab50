//! 模块元数据定义
//!
//! 定义模块描述信息与生命周期状态的数据结构。

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 模块 ID 合法性校验
fn id_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[a-z][a-z0-9_.-]*$").expect("模块 ID 正则无效"))
}

/// 包名合法性校验（点分标识符，如 `commons.util`）
fn package_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("包名正则无效")
    })
}

/// 模块生命周期状态
///
/// 状态机：Installed -> Resolved -> Active -> Stopping -> Resolved，
/// 任意非 Uninstalled 状态都可以转入 Uninstalled（Active 模块会先停止）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// 已安装，布线尚未计算
    Installed,
    /// 依赖已布线，代码尚未激活
    Resolved,
    /// 运行中
    Active,
    /// 正在停止（瞬态）
    Stopping,
    /// 已卸载（终态）
    Uninstalled,
}

impl Default for ModuleState {
    fn default() -> Self {
        ModuleState::Installed
    }
}

impl ModuleState {
    /// 是否可以布线（解析依赖）
    pub fn can_resolve(&self) -> bool {
        matches!(self, ModuleState::Installed)
    }

    /// 是否可以启动
    ///
    /// 从 Installed 启动会先隐式布线。
    pub fn can_start(&self) -> bool {
        matches!(self, ModuleState::Installed | ModuleState::Resolved)
    }

    /// 是否可以停止
    pub fn can_stop(&self) -> bool {
        matches!(self, ModuleState::Active)
    }

    /// 是否可以卸载
    pub fn can_uninstall(&self) -> bool {
        !matches!(self, ModuleState::Uninstalled)
    }

    /// 该状态下模块是否参与动态类解析
    ///
    /// 仅 Active 模块参与："类可见"蕴含"模块激活生命周期已执行"，
    /// 调用方可以依赖激活阶段的副作用。Resolved 模块被有意排除。
    pub fn is_class_resolvable(&self) -> bool {
        matches!(self, ModuleState::Active)
    }
}

impl std::fmt::Display for ModuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleState::Installed => write!(f, "Installed"),
            ModuleState::Resolved => write!(f, "Resolved"),
            ModuleState::Active => write!(f, "Active"),
            ModuleState::Stopping => write!(f, "Stopping"),
            ModuleState::Uninstalled => write!(f, "Uninstalled"),
        }
    }
}

/// 模块元数据
///
/// 描述一个可安装的代码单元：稳定标识、版本，以及对外导出的包名集合。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// 模块唯一标识
    pub id: String,

    /// 模块显示名称
    pub name: String,

    /// 模块版本（semver 格式）
    pub version: String,

    /// 模块描述
    #[serde(default)]
    pub description: String,

    /// 作者信息
    #[serde(default)]
    pub author: String,

    /// 导出的包名列表
    ///
    /// 声明即生效，与当前生命周期状态无关；状态过滤由动态类加载器负责。
    #[serde(default)]
    pub exports: Vec<String>,
}

impl ModuleMetadata {
    /// 创建新的模块元数据
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: String::new(),
            author: String::new(),
            exports: Vec::new(),
        }
    }

    /// 追加一个导出包
    pub fn with_export(mut self, package: impl Into<String>) -> Self {
        self.exports.push(package.into());
        self
    }

    /// 设置导出包列表
    pub fn with_exports<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = packages.into_iter().map(Into::into).collect();
        self
    }

    /// 解析版本号
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }

    /// 验证元数据有效性
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = vec![];

        if self.id.is_empty() {
            errors.push("模块 ID 不能为空".to_string());
        } else if !id_regex().is_match(&self.id) {
            errors.push(format!("模块 ID 格式无效: {}", self.id));
        }

        if self.name.is_empty() {
            errors.push("模块名称不能为空".to_string());
        }

        if Version::parse(&self.version).is_err() {
            errors.push(format!("无效的版本号格式: {}", self.version));
        }

        for package in &self.exports {
            if !package_regex().is_match(package) {
                errors.push(format!("导出包名格式无效: {}", package));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// 模块运行时信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// 模块元数据
    pub metadata: ModuleMetadata,

    /// 当前生命周期状态
    pub state: ModuleState,

    /// 安装时间
    pub installed_at: DateTime<Utc>,

    /// 布线完成时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    /// 启动时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// 最后错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ModuleInfo {
    /// 创建新的模块信息（初始状态为 Installed）
    pub fn new(metadata: ModuleMetadata) -> Self {
        Self {
            metadata,
            state: ModuleState::Installed,
            installed_at: Utc::now(),
            resolved_at: None,
            started_at: None,
            last_error: None,
        }
    }

    /// 获取模块 ID
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// 获取模块版本
    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// 检查模块是否处于 Active 状态
    pub fn is_active(&self) -> bool {
        self.state == ModuleState::Active
    }

    /// 检查模块是否声明导出指定包
    pub fn exports_package(&self, package: &str) -> bool {
        self.metadata.exports.iter().any(|p| p == package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_creation() {
        let metadata = ModuleMetadata::new("commons-util", "Commons Util", "2.1.0")
            .with_export("commons.util");

        assert_eq!(metadata.id, "commons-util");
        assert_eq!(metadata.version, "2.1.0");
        assert_eq!(metadata.exports, vec!["commons.util".to_string()]);
    }

    #[test]
    fn test_metadata_validation() {
        let metadata = ModuleMetadata::new("commons-util", "Commons Util", "2.1.0");
        assert!(metadata.validate().is_ok());

        let bad_version = ModuleMetadata::new("commons-util", "Commons Util", "not-a-version");
        assert!(bad_version.validate().is_err());

        let bad_id = ModuleMetadata::new("Bad Id!", "Bad", "1.0.0");
        assert!(bad_id.validate().is_err());

        let bad_package =
            ModuleMetadata::new("m", "M", "1.0.0").with_export("1nvalid..package");
        assert!(bad_package.validate().is_err());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let metadata = ModuleMetadata::new("", "", "x").with_export("..");
        let errors = metadata.validate().unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_state_transitions() {
        assert!(ModuleState::Installed.can_resolve());
        assert!(!ModuleState::Resolved.can_resolve());

        assert!(ModuleState::Installed.can_start());
        assert!(ModuleState::Resolved.can_start());
        assert!(!ModuleState::Active.can_start());

        assert!(ModuleState::Active.can_stop());
        assert!(!ModuleState::Resolved.can_stop());

        assert!(ModuleState::Active.can_uninstall());
        assert!(!ModuleState::Uninstalled.can_uninstall());
    }

    #[test]
    fn test_class_resolvable_only_when_active() {
        assert!(ModuleState::Active.is_class_resolvable());
        assert!(!ModuleState::Installed.is_class_resolvable());
        assert!(!ModuleState::Resolved.is_class_resolvable());
        assert!(!ModuleState::Stopping.is_class_resolvable());
        assert!(!ModuleState::Uninstalled.is_class_resolvable());
    }

    #[test]
    fn test_exports_package() {
        let metadata = ModuleMetadata::new("commons-util", "Commons Util", "2.1.0")
            .with_export("commons.util");
        let info = ModuleInfo::new(metadata);

        assert!(info.exports_package("commons.util"));
        assert!(!info.exports_package("commons.util.internal"));
        assert!(!info.exports_package("other.pkg"));
    }

    #[test]
    fn test_metadata_serialization() {
        let metadata = ModuleMetadata::new("commons-util", "Commons Util", "2.1.0")
            .with_exports(["commons.util", "commons.text"]);

        let yaml = serde_yaml::to_string(&metadata).unwrap();
        let parsed: ModuleMetadata = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.id, metadata.id);
        assert_eq!(parsed.exports.len(), 2);
    }

    #[test]
    fn test_state_serialization() {
        let yaml = serde_yaml::to_string(&ModuleState::Active).unwrap();
        assert_eq!(yaml.trim(), "active");
    }
}
