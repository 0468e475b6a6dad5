//! Type definitions for the bootstrap pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::build::BuildInvoker;
use crate::config::RuntimeConfig;

/// Caller-facing bootstrap options.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Free-form options string forwarded verbatim to the build command.
    pub build_opts: Option<String>,
    /// Optional build deadline. None preserves the reference behavior of an
    /// unbounded build.
    pub build_timeout: Option<Duration>,
}

/// Shared bootstrap pipeline context.
///
/// Stores the immutable configuration, the stage inputs, and the launch
/// output across all tasks.
pub struct BootContext {
    pub config: RuntimeConfig,
    pub build_opts: Option<String>,
    pub invoker: BuildInvoker,
    /// PID of the launched node (set by the launch task).
    pub node_pid: Option<u32>,
}

impl BootContext {
    pub fn new(config: RuntimeConfig, invoker: BuildInvoker, build_opts: Option<String>) -> Self {
        Self {
            config,
            build_opts,
            invoker,
            node_pid: None,
        }
    }
}

pub type BootCtx = Arc<Mutex<BootContext>>;
