//! # Run Configuration Module / 运行配置模块
//!
//! Turns the raw flag bag parsed by the CLI into one immutable, validated
//! configuration value. All cross-flag constraints are checked here in a
//! single construction step, before anything touches the file system or
//! spawns a process, and every violated constraint is reported at once.
//!
//! 将 CLI 解析出的原始标志集合转换为一个不可变的、已验证的配置值。
//! 所有跨标志约束都在这一个构造步骤中检查，先于任何文件系统操作或
//! 进程派生，并且一次性报告所有被违反的约束。

use std::fmt;

use crate::infra::t;

/// The integration flags exactly as parsed, before validation.
/// 验证前与解析结果一一对应的集成测试标志。
#[derive(Debug, Clone)]
pub struct IntegrationOptions {
    pub version: Option<String>,
    pub python_only: bool,
    pub scala_only: bool,
    pub pip_only: bool,
    pub no_pip: bool,
    pub scala_version: String,
    pub test_filter: Option<String>,
    pub maven_repo: Option<String>,
    pub use_testpypi: bool,
    pub use_local: bool,
    pub storage_integration: bool,
    pub dbb_packages: Option<String>,
    pub dbb_conf: Vec<String>,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            version: None,
            python_only: false,
            scala_only: false,
            pip_only: false,
            no_pip: false,
            scala_version: "2.12".to_string(),
            test_filter: None,
            maven_repo: None,
            use_testpypi: false,
            use_local: false,
            storage_integration: false,
            dbb_packages: None,
            dbb_conf: Vec::new(),
        }
    }
}

/// A configuration rejected at construction. Collects every violated
/// constraint so the user fixes the whole command line in one round trip.
///
/// 在构造阶段被拒绝的配置。收集所有被违反的约束，
/// 让用户一次性修正整条命令行。
#[derive(Debug)]
pub struct ConfigError {
    violations: Vec<String>,
}

impl ConfigError {
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", t!("config.header"))?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

/// The resolved, immutable configuration of one integration run.
/// 单次集成运行的最终不可变配置。
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    /// Version under test; defaults to the one declared in `version.sbt`.
    pub version: String,
    /// The version declared in `version.sbt`.
    pub default_version: String,
    pub scala_version: String,
    pub test_filter: Option<String>,
    pub maven_repo: Option<String>,
    pub use_testpypi: bool,
    pub use_local: bool,
    /// When set, the storage channel runs exclusively.
    /// 设置时仅运行存储通道。
    pub storage_integration: bool,
    pub dbb_packages: Option<String>,
    pub dbb_conf: Vec<String>,
    pub run_scala: bool,
    pub run_python: bool,
    pub run_pip: bool,
}

impl IntegrationConfig {
    /// Validates the raw options against the resolved default version and
    /// produces the final configuration.
    ///
    /// Constraints: `--pip-only` contradicts `--no-pip`; `--use-local` always
    /// tests the working tree's own version, so an explicit different
    /// `--version` is contradictory.
    ///
    /// 根据解析出的默认版本验证原始选项并生成最终配置。
    /// 约束：`--pip-only` 与 `--no-pip` 矛盾；`--use-local` 总是测试
    /// 工作树自身的版本，因此显式指定不同的 `--version` 是矛盾的。
    pub fn resolve(
        options: IntegrationOptions,
        default_version: String,
    ) -> Result<Self, ConfigError> {
        let mut violations = Vec::new();

        if options.pip_only && options.no_pip {
            violations.push(t!("config.pip_only_and_no_pip").to_string());
        }

        let version = options
            .version
            .clone()
            .unwrap_or_else(|| default_version.clone());
        if options.use_local && version != default_version {
            violations.push(
                t!(
                    "config.use_local_version",
                    version = &version,
                    default = &default_version
                )
                .to_string(),
            );
        }

        if !violations.is_empty() {
            return Err(ConfigError { violations });
        }

        Ok(Self {
            version,
            default_version,
            scala_version: options.scala_version,
            test_filter: options.test_filter,
            maven_repo: options.maven_repo,
            use_testpypi: options.use_testpypi,
            use_local: options.use_local,
            storage_integration: options.storage_integration,
            dbb_packages: options.dbb_packages,
            dbb_conf: options.dbb_conf,
            run_scala: !options.python_only && !options.pip_only,
            run_python: !options.scala_only && !options.pip_only,
            run_pip: !options.python_only && !options.scala_only && !options.no_pip,
        })
    }
}
