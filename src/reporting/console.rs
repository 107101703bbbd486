//! # Console Reporting Module / 控制台报告模块
//!
//! All user-facing progress output: channel banners, per-target lines and
//! the final summary table. Every failure is named here before it
//! propagates, so the last lines before a non-zero exit always identify the
//! failing unit.
//!
//! 所有面向用户的进度输出：通道横幅、逐目标行和最终摘要表。
//! 每个失败在传播前都会在此被点名，
//! 因此非零退出前的最后几行总能指出失败的单元。

use colored::*;

use crate::core::models::{Channel, RunReport, TargetStatus};
use crate::infra::command::Invocation;
use crate::infra::t;

pub fn channel_banner(channel: Channel, version: &str) {
    println!(
        "\n\n{}",
        t!(
            "run.channel_banner",
            channel = channel.label(),
            version = version
        )
        .bold()
    );
}

/// The Scala banner also names the binding version the channel was pinned to.
pub fn scala_banner(version: &str, scala_version: &str) {
    println!(
        "\n\n{}",
        t!(
            "run.scala_banner",
            version = version,
            scala_version = scala_version
        )
        .bold()
    );
}

pub fn running_target(channel: Channel, name: &str) {
    println!(
        "\n{}\n=====================",
        t!("run.running_target", channel = channel.label(), name = name).blue()
    );
}

pub fn skipping_target(channel: Channel, name: &str) {
    println!(
        "\n{}\n=====================",
        t!("run.skipping_target", channel = channel.label(), name = name).dimmed()
    );
}

pub fn failed_target(channel: Channel, name: &str) {
    println!(
        "{}",
        t!("run.failed_target", channel = channel.label(), name = name).red()
    );
}

pub fn command_line(invocation: &Invocation) {
    println!("{} {}", t!("run.command").blue(), invocation.command_line());
}

/// Prints a formatted summary of the run to the console: one line per
/// target with its channel, status and duration.
///
/// 在控制台打印运行摘要：每个目标一行，包含通道、状态和耗时。
///
/// # Output Format / 输出格式
/// ```text
/// --- Run Summary ---
///   - Passed   | Scala                         | Quickstart                               |      12.31s
///   - Failed   | Python                        | quickstart.py                            |       4.02s
///   - Skipped  | pip installation              | using_with_pip.py                        |        N/A
/// ```
pub fn print_summary(report: &RunReport) {
    println!("\n{}", t!("run.summary_banner").bold());

    for channel in &report.channels {
        for target in &channel.targets {
            let status_str = target.status.status_str();
            let status_colored = match target.status {
                TargetStatus::Passed => status_str.green(),
                TargetStatus::Failed => status_str.red(),
                TargetStatus::Skipped => status_str.dimmed(),
            };
            let duration_str = target
                .duration_secs
                .map(|d| format!("{:.2}s", d))
                .unwrap_or_else(|| "N/A".to_string());

            println!(
                "  - {:<8} | {:<29} | {:<40} | {:>10}",
                status_colored,
                channel.channel.label(),
                target.name,
                duration_str
            );
        }
    }
}
