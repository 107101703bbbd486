//! # Reporting Module / 报告模块
//!
//! Console output and the persisted JSON run report.
//!
//! 控制台输出和持久化的 JSON 运行报告。

pub mod console;
pub mod summary;
