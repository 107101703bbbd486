//! # Process Execution Module / 进程执行模块
//!
//! This module runs the external tools every channel is built on (sbt,
//! spark-submit, pip, python, docker). An [`Invocation`] describes one child
//! process: its argument vector, an environment overlay and an optional
//! working directory. The [`CommandRunner`] trait is the seam between the
//! dispatch logic and the operating system, so the decision trees above it
//! can be exercised without spawning real tools.
//!
//! 此模块运行各通道所依赖的外部工具（sbt、spark-submit、pip、python、docker）。
//! 一个 [`Invocation`] 描述一个子进程：参数向量、环境变量覆盖层和可选的工作目录。
//! [`CommandRunner`] trait 是调度逻辑与操作系统之间的接缝，
//! 使其上层的决策树无需派生真实工具即可被测试。

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Exit code reported when the child was terminated by a signal and never
/// produced a real code of its own.
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// A single external process invocation.
///
/// The environment overlay is merged over the ambient environment of this
/// process; on a key collision the overlay wins. The ambient environment is
/// never replaced or mutated.
///
/// 单次外部进程调用。
/// 环境覆盖层会合并到本进程的环境之上；键冲突时覆盖层优先。
/// 环境本身永远不会被替换或修改。
#[derive(Debug, Clone)]
pub struct Invocation {
    argv: Vec<String>,
    env: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            current_dir: None,
        }
    }

    /// Parses a full command line into an invocation using shell word
    /// splitting rules. Used where a command is naturally built as a string,
    /// e.g. the docker plumbing.
    ///
    /// 使用 shell 分词规则将完整命令行解析为一次调用。
    /// 用于命令天然以字符串形式构建的场合，例如 docker 相关逻辑。
    pub fn from_line(line: &str) -> Result<Self> {
        let argv =
            shlex::split(line).ok_or_else(|| anyhow::anyhow!("Failed to parse command: {line}"))?;
        if argv.is_empty() {
            anyhow::bail!("Empty command line");
        }
        Ok(Self::new(argv))
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn envs<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env.extend(vars);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn env_overlay(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// The command rendered for log lines and error messages.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Streaming mode with the raise-on-nonzero policy: the child inherits
    /// this process's stdio and a non-zero exit becomes an error carrying the
    /// exit code.
    ///
    /// 流式模式，非零退出即报错：子进程继承本进程的标准输入输出，
    /// 非零退出码会转换为携带该退出码的错误。
    pub async fn run(&self, runner: &dyn CommandRunner) -> Result<()> {
        let code = runner.stream(self).await?;
        if code != 0 {
            return Err(CommandFailure {
                command: self.command_line(),
                code,
                stdout: None,
                stderr: None,
            }
            .into());
        }
        Ok(())
    }

    /// Streaming mode where the caller inspects the exit code itself.
    pub async fn status(&self, runner: &dyn CommandRunner) -> Result<i32> {
        runner.stream(self).await
    }

    /// Capture mode with the raise-on-nonzero policy: both output streams are
    /// buffered and decoded, and on a non-zero exit they travel inside the
    /// error so the failure is diagnosable from the log alone.
    ///
    /// 捕获模式，非零退出即报错：两个输出流都会被缓冲并解码，
    /// 非零退出时它们随错误一起传播，仅凭日志即可定位失败。
    pub async fn output(&self, runner: &dyn CommandRunner) -> Result<Captured> {
        let captured = runner.capture(self).await?;
        if captured.code != 0 {
            return Err(CommandFailure {
                command: self.command_line(),
                code: captured.code,
                stdout: Some(captured.stdout),
                stderr: Some(captured.stderr),
            }
            .into());
        }
        Ok(captured)
    }

    fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.argv[0]);
        cmd.args(&self.argv[1..]).kill_on_drop(true);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// The buffered result of a capture-mode invocation.
#[derive(Debug, Clone)]
pub struct Captured {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// A non-zero exit from an external process. In capture mode the decoded
/// output streams are embedded so the caller can surface them.
///
/// 外部进程的非零退出。捕获模式下会嵌入解码后的输出流，供调用方呈现。
#[derive(Debug)]
pub struct CommandFailure {
    pub command: String,
    pub code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Non-zero exit code: {} from command: {}",
            self.code, self.command
        )?;
        if let (Some(stdout), Some(stderr)) = (&self.stdout, &self.stderr) {
            write!(f, "\n\nSTDOUT:\n{}\n\nSTDERR:\n{}", stdout, stderr)?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandFailure {}

/// The seam between channel dispatch and the operating system.
///
/// `stream` runs the child with inherited stdio so its output is observed
/// live, returning only the raw exit code. `capture` buffers both streams and
/// decodes them to text. Neither applies an error policy; the policy lives on
/// [`Invocation`]. No retries, no timeouts: a hanging tool hangs the run.
///
/// 通道调度与操作系统之间的接缝。
/// `stream` 让子进程继承标准输入输出以便实时观察输出，只返回原始退出码。
/// `capture` 缓冲并解码两个输出流。两者均不应用错误策略；
/// 策略在 [`Invocation`] 上。无重试、无超时：外部工具挂起则整个运行挂起。
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn stream(&self, invocation: &Invocation) -> Result<i32>;
    async fn capture(&self, invocation: &Invocation) -> Result<Captured>;
}

/// The real implementation on top of `tokio::process`.
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn stream(&self, invocation: &Invocation) -> Result<i32> {
        let status = invocation
            .to_command()
            .status()
            .await
            .with_context(|| format!("Failed to spawn command: {}", invocation.command_line()))?;
        Ok(status.code().unwrap_or(SIGNAL_EXIT_CODE))
    }

    async fn capture(&self, invocation: &Invocation) -> Result<Captured> {
        let output = invocation
            .to_command()
            .output()
            .await
            .with_context(|| format!("Failed to spawn command: {}", invocation.command_line()))?;
        Ok(Captured {
            code: output.status.code().unwrap_or(SIGNAL_EXIT_CODE),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
