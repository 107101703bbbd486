//! # Infrastructure Module / 基础设施模块
//!
//! Infrastructure services shared by every channel: external process
//! execution, artifact cache cleanup and the container image cache.
//!
//! 各通道共享的基础设施服务：外部进程执行、产物缓存清理和容器镜像缓存。

pub mod command;
pub mod docker;
pub mod fs;

pub use rust_i18n::t;
