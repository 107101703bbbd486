//! # Image Cache Module / 镜像缓存模块
//!
//! Prepares the container image the unit suite runs in. The image tag embeds
//! a content hash of the Dockerfile, so an image is reused until the recipe
//! changes and any edit to it is automatically a cache miss. With a registry
//! configured the cache tries pull, then build, then push; pulling and
//! pushing are optimizations and may fail, building is mandatory.
//!
//! 准备运行单元测试套件的容器镜像。镜像标签嵌入了 Dockerfile 的内容哈希，
//! 因此在配方未变时镜像可被复用，任何修改都会自动视为缓存未命中。
//! 配置了仓库时，缓存依次尝试拉取、构建、推送；
//! 拉取和推送是优化手段，允许失败，构建则是必须成功的。

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::infra::command::{CommandRunner, Invocation};
use crate::infra::t;

/// Local image repository name; the digest of the recipe becomes the tag.
pub const IMAGE_REPOSITORY: &str = "delta_test_env";

/// Namespace the image lives under in a remote registry.
pub const REGISTRY_NAMESPACE: &str = "delta";

/// Host environment variables forwarded by name into the container.
pub const FORWARDED_ENV_VARS: &[&str] = &["JENKINS_URL", "SBT_1_5_5_MIRROR_JAR_URL"];

/// Hashes the recipe file contents. The digest is a pure function of the file
/// bytes: identical content always yields the identical digest.
///
/// 计算配方文件内容的哈希。摘要是文件字节的纯函数：
/// 内容相同则摘要必然相同。
pub fn recipe_digest(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read recipe file {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Derives the local image tag from a recipe digest.
pub fn image_tag(digest: &str) -> String {
    format!("{IMAGE_REPOSITORY}:{digest}")
}

/// How the prepared image was obtained.
///
/// Pull and push outcomes are explicit values rather than errors because the
/// caller treats them differently from a build failure: a miss or a failed
/// push only degrades to the slower path.
///
/// 准备好的镜像的来源。
/// 拉取与推送的结果用显式取值而非错误表示，因为调用方对它们的处理
/// 不同于构建失败：未命中或推送失败只会退化到较慢的路径。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Reused from the registry; build was not invoked.
    Pulled,
    /// Built locally from the recipe.
    Built {
        /// Whether the freshly built image also reached the registry.
        pushed: bool,
    },
}

/// A locally available image, ready to run containers from.
#[derive(Debug)]
pub struct PreparedImage {
    pub tag: String,
    pub source: ImageSource,
}

/// The pull-or-build-then-push decision tree over a configured registry.
pub struct ImageCache {
    registry: Option<String>,
}

impl ImageCache {
    pub fn new(registry: Option<String>) -> Self {
        Self {
            registry: registry.filter(|r| !r.is_empty()),
        }
    }

    /// Reads the registry location from `DOCKER_REGISTRY`.
    pub fn from_env() -> Self {
        Self::new(env::var("DOCKER_REGISTRY").ok())
    }

    /// Makes the image for `{root}/Dockerfile` available under its local tag.
    ///
    /// With a registry: pull the remote tag and re-tag it locally; on a pull
    /// failure build from the recipe and then push the result under the same
    /// remote tag, where a push failure is logged but never fatal. Without a
    /// registry: always build.
    ///
    /// 使 `{root}/Dockerfile` 对应的镜像在本地标签下可用。
    /// 有仓库时：拉取远端标签并重打本地标签；拉取失败则从配方构建，
    /// 再以相同远端标签推送，推送失败仅记录日志，绝不致命。
    /// 无仓库时：总是构建。
    pub async fn prepare(&self, root: &Path, runner: &dyn CommandRunner) -> Result<PreparedImage> {
        let digest = recipe_digest(&root.join("Dockerfile"))?;
        println!("{}", t!("docker.recipe_digest", digest = &digest));
        let local_tag = image_tag(&digest);
        println!("{}", t!("docker.image_tag", tag = &local_tag));

        let source = match &self.registry {
            Some(registry) => {
                println!("{}", t!("docker.using_registry", registry = registry));
                let remote_tag = format!("{registry}/{REGISTRY_NAMESPACE}/{local_tag}");
                if self.pull(&remote_tag, &local_tag, runner).await {
                    ImageSource::Pulled
                } else {
                    self.build(&local_tag, root, runner).await?;
                    let pushed = self.push(&local_tag, &remote_tag, runner).await;
                    ImageSource::Built { pushed }
                }
            }
            None => {
                println!("{}", t!("docker.no_registry"));
                self.build(&local_tag, root, runner).await?;
                ImageSource::Built { pushed: false }
            }
        };

        Ok(PreparedImage {
            tag: local_tag,
            source,
        })
    }

    async fn pull(&self, remote_tag: &str, local_tag: &str, runner: &dyn CommandRunner) -> bool {
        println!("---\n{}", t!("docker.pulling", tag = remote_tag));
        let outcome: Result<()> = async {
            Invocation::from_line(&format!("docker pull {remote_tag}"))?
                .run(runner)
                .await?;
            Invocation::from_line(&format!("docker tag {remote_tag} {local_tag}"))?
                .run(runner)
                .await
        }
        .await;
        match outcome {
            Ok(()) => {
                println!("{}", t!("docker.pull_ok", tag = remote_tag));
                true
            }
            Err(e) => {
                println!("{}", t!("docker.pull_failed", tag = remote_tag, error = e));
                false
            }
        }
    }

    async fn build(&self, tag: &str, root: &Path, runner: &dyn CommandRunner) -> Result<()> {
        println!("---\n{}", t!("docker.building", tag = tag));
        Invocation::new([
            "docker".to_string(),
            "build".to_string(),
            format!("--tag={tag}"),
            root.display().to_string(),
        ])
        .run(runner)
        .await?;
        println!("{}", t!("docker.built", tag = tag));
        Ok(())
    }

    async fn push(&self, local_tag: &str, remote_tag: &str, runner: &dyn CommandRunner) -> bool {
        println!("---\n{}", t!("docker.pushing", tag = remote_tag));
        let outcome: Result<()> = async {
            Invocation::from_line(&format!("docker tag {local_tag} {remote_tag}"))?
                .run(runner)
                .await?;
            Invocation::from_line(&format!("docker push {remote_tag}"))?
                .run(runner)
                .await
        }
        .await;
        match outcome {
            Ok(()) => {
                println!("{}", t!("docker.push_ok", tag = remote_tag));
                true
            }
            Err(e) => {
                println!("{}", t!("docker.push_failed", tag = remote_tag, error = e));
                false
            }
        }
    }
}

/// Re-invokes this executable's `unit` subcommand inside a container made
/// from the given image, with the working directory mounted at the same path.
/// Only the variables the suite needs are forwarded; `USE_DOCKER` is
/// deliberately not among them, so the inner run executes natively instead of
/// recursing into another container.
///
/// 在由给定镜像创建的容器内重新调用本可执行文件的 `unit` 子命令，
/// 工作目录以相同路径挂载。只转发套件需要的变量；`USE_DOCKER` 被有意排除，
/// 因此容器内的运行会原生执行而不会递归启动另一个容器。
pub async fn run_in_container(tag: &str, workdir: &Path, runner: &dyn CommandRunner) -> Result<()> {
    let exe = env::current_exe().context("Failed to locate the current executable")?;
    let dir = workdir.display().to_string();

    let mut argv: Vec<String> = vec![
        "docker".into(),
        "run".into(),
        "--rm".into(),
        "-v".into(),
        format!("{dir}:{dir}"),
        "-w".into(),
        dir,
    ];
    for var in FORWARDED_ENV_VARS {
        argv.push("-e".into());
        argv.push((*var).into());
    }
    if let Ok(scala_version) = env::var("SCALA_VERSION") {
        if !scala_version.is_empty() {
            argv.push("-e".into());
            argv.push(format!("SCALA_VERSION={scala_version}"));
        }
    }
    argv.push(tag.into());
    argv.push(exe.display().to_string());
    argv.push("unit".into());

    println!("{}", t!("docker.run_in_container", tag = tag));
    Invocation::new(argv).run(runner).await
}
