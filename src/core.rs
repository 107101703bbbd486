//! # Core Module / 核心模块
//!
//! Run configuration, test target discovery and the channel dispatchers.
//!
//! 运行配置、测试目标发现和通道调度器。

pub mod channels;
pub mod config;
pub mod models;
pub mod targets;
