//! # CLI Commands Module / CLI 命令模块
//!
//! One module per subcommand.
//!
//! 每个子命令一个模块。

pub mod integration;
pub mod unit;
