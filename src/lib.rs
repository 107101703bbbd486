//! # Channel Runner Library / Channel Runner 库
//!
//! This library provides the core functionality for the Channel Runner tool,
//! a command-line orchestrator for a data-lake storage library's test suites.
//! It dispatches integration and unit tests across several channels (Scala,
//! Python, pip installation, storage-backend integration) by driving the
//! external build and submission tools for each one.
//!
//! 此库为 Channel Runner 工具提供核心功能，
//! 这是一个数据湖存储库测试套件的命令行编排工具。
//! 它通过驱动各通道的外部构建与提交工具，在多个通道
//! （Scala、Python、pip 安装、存储后端集成）之间调度集成与单元测试。
//!
//! ## Modules / 模块
//!
//! - `core` - Run configuration, target discovery and channel dispatch
//! - `infra` - Infrastructure services like process execution, cache cleanup and the image cache
//! - `reporting` - Console output and the JSON run report
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 运行配置、目标发现和通道调度
//! - `infra` - 基础设施服务，如进程执行、缓存清理和镜像缓存
//! - `reporting` - 控制台输出和 JSON 运行报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::config;
pub use crate::core::models;
pub use crate::core::targets;

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
