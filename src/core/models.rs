//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures shared across the runner:
//! the test channels, per-target outcomes and the run report.
//!
//! 此模块定义了运行器共享的核心数据结构：
//! 测试通道、单个目标的结果和运行报告。

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::infra::t;

/// One category of test suite. A run dispatches one or more channels; each
/// channel owns its own target discovery and invocation shape.
///
/// 一类测试套件。一次运行会调度一个或多个通道；
/// 每个通道拥有自己的目标发现方式和调用形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    /// Example programs run through the Scala build tool.
    /// 通过 Scala 构建工具运行的示例程序。
    Scala,
    /// Example scripts submitted to the compute engine.
    /// 提交给计算引擎的示例脚本。
    Python,
    /// Package installation from a package index, run with a plain interpreter.
    /// 从包索引安装后用普通解释器运行。
    Pip,
    /// The S3/DynamoDB storage backend integration suite.
    /// S3/DynamoDB 存储后端集成套件。
    StorageDynamoDb,
}

impl Channel {
    /// Human-readable name used in banners and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Scala => "Scala",
            Channel::Python => "Python",
            Channel::Pip => "pip installation",
            Channel::StorageDynamoDb => "DynamoDB logstore integration",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The outcome of a single discovered target.
/// 单个已发现目标的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetStatus {
    Passed,
    Failed,
    /// Filtered out by the name filter or a mode gate; never invoked.
    /// 被名称过滤器或模式开关排除，从未被调用。
    Skipped,
}

impl TargetStatus {
    /// Localized status text for the console summary.
    /// 控制台摘要使用的本地化状态文本。
    pub fn status_str(&self) -> String {
        match self {
            TargetStatus::Passed => t!("report.status_passed").to_string(),
            TargetStatus::Failed => t!("report.status_failed").to_string(),
            TargetStatus::Skipped => t!("report.status_skipped").to_string(),
        }
    }
}

/// One executed (or skipped) target in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub name: String,
    pub status: TargetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// All targets of one dispatched channel.
#[derive(Debug, Serialize)]
pub struct ChannelReport {
    pub channel: Channel,
    pub targets: Vec<TargetReport>,
}

/// The machine-readable record of a whole run. It is filled in dispatch
/// order while channels execute, so on a fail-fast abort it still names the
/// failing target and everything that ran before it.
///
/// 整次运行的机器可读记录。按调度顺序在通道执行时填充，
/// 因此快速失败中止时仍能指出失败的目标以及此前运行的所有内容。
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub version: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub channels: Vec<ChannelReport>,
}

impl RunReport {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            channels: Vec::new(),
        }
    }

    /// Opens a new channel section; subsequent records land in it.
    pub fn open_channel(&mut self, channel: Channel) {
        self.channels.push(ChannelReport {
            channel,
            targets: Vec::new(),
        });
    }

    /// Records one target outcome into the most recently opened channel.
    pub fn record(&mut self, name: &str, status: TargetStatus, duration: Option<Duration>) {
        if let Some(channel) = self.channels.last_mut() {
            channel.targets.push(TargetReport {
                name: name.to_string(),
                status,
                duration_secs: duration.map(|d| d.as_secs_f64()),
            });
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
