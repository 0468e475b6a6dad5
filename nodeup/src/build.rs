//! Build invocation for the node binary.
//!
//! The invoker runs the build tool synchronously to completion with stdio
//! inherited, so compiler output reaches the operator directly. A non-zero
//! exit aborts the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{NodeupError, NodeupResult};

/// Runs the build tool that produces the node binary.
#[derive(Debug, Clone)]
pub struct BuildInvoker {
    program: PathBuf,
    workdir: PathBuf,
    timeout: Option<Duration>,
}

impl BuildInvoker {
    /// Invoker for `cargo build` in `workdir` with no deadline (the
    /// reference behavior: the build may block indefinitely).
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("cargo"),
            workdir: workdir.into(),
            timeout: None,
        }
    }

    /// Substitute the build program. Production always builds with cargo;
    /// tests exercise the pipeline with stand-in programs.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Optional build deadline. When exceeded the build child is killed and
    /// the stage fails.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Argument vector for the build command. The caller-supplied options
    /// string is split on whitespace and appended verbatim.
    fn args(build_opts: Option<&str>) -> Vec<String> {
        let mut args = vec!["build".to_string()];
        if let Some(opts) = build_opts {
            args.extend(opts.split_whitespace().map(str::to_string));
        }
        args
    }

    /// Run the build to completion.
    pub async fn run(&self, build_opts: Option<&str>) -> NodeupResult<()> {
        let args = Self::args(build_opts);
        info!(
            program = %self.program.display(),
            args = ?args,
            "building node binary"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&args).current_dir(&self.workdir);

        let status = match self.timeout {
            Some(limit) => {
                // Without this the build child would outlive a fired deadline
                cmd.kill_on_drop(true);
                tokio::time::timeout(limit, cmd.status())
                    .await
                    .map_err(|_| {
                        NodeupError::Build(format!("build exceeded {:?} deadline", limit))
                    })?
            }
            None => cmd.status().await,
        }
        .map_err(|e| {
            NodeupError::Build(format!(
                "failed to run {}: {}",
                self.program.display(),
                e
            ))
        })?;

        if !status.success() {
            return Err(NodeupError::Build(format!("build exited with {}", status)));
        }

        debug!("build complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_string_is_forwarded_verbatim() {
        assert_eq!(BuildInvoker::args(None), vec!["build"]);
        assert_eq!(
            BuildInvoker::args(Some("-F abi-7-23")),
            vec!["build", "-F", "abi-7-23"]
        );
        assert_eq!(
            BuildInvoker::args(Some("--release -F s3 --locked")),
            vec!["build", "--release", "-F", "s3", "--locked"]
        );
    }

    #[tokio::test]
    async fn succeeds_on_zero_exit() {
        let invoker = BuildInvoker::new(".").with_program("true");
        invoker.run(None).await.unwrap();
    }

    #[tokio::test]
    async fn fails_on_nonzero_exit() {
        let invoker = BuildInvoker::new(".").with_program("false");
        let err = invoker.run(Some("-F abi-7-23")).await.unwrap_err();
        assert!(matches!(err, NodeupError::Build(_)));
    }

    #[tokio::test]
    async fn fails_on_missing_program() {
        let invoker = BuildInvoker::new(".").with_program("/nonexistent/build-tool");
        let err = invoker.run(None).await.unwrap_err();
        assert!(matches!(err, NodeupError::Build(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn deadline_aborts_a_hung_build() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-build");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let invoker = BuildInvoker::new(".")
            .with_program(&script)
            .with_timeout(Some(Duration::from_millis(200)));
        let err = invoker.run(None).await.unwrap_err();
        assert!(err.to_string().contains("deadline"));
    }
}
