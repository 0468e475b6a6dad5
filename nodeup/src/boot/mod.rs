//! Bootstrap orchestration.
//!
//! ## Architecture
//!
//! The bootstrap is a single-pass, strictly sequential pipeline:
//!
//! ```text
//! 1. MountReconcile   (unmount stale mount, remove directory)
//! 2. Build            (cargo build, optional feature flags)
//! 3. Launch           (create mount directory, start node, hand off)
//! ```
//!
//! Configuration is resolved before the pipeline starts and threaded
//! through the shared context; each stage gates the next and any failure
//! aborts the run. Nothing is rolled back: completed stage effects are
//! left in place.

mod tasks;
mod types;

pub use types::BootstrapOptions;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::build::BuildInvoker;
use crate::config::RuntimeConfig;
use crate::errors::{NodeupError, NodeupResult};
use crate::pipeline::{BoxedTask, ExecutionPlan, PipelineExecutor, Stage};
use tasks::{BuildTask, LaunchTask, MountReconcileTask};
use types::{BootContext, BootCtx};

fn execution_plan() -> ExecutionPlan<BootCtx> {
    let stages: Vec<Stage<BoxedTask<BootCtx>>> = vec![
        Stage::sequential(vec![Box::new(MountReconcileTask)]),
        Stage::sequential(vec![Box::new(BuildTask)]),
        Stage::sequential(vec![Box::new(LaunchTask)]),
    ];
    ExecutionPlan::new(stages)
}

/// Run the full bootstrap pipeline and return the launched node's PID.
///
/// The build runs in the current working tree. On success the node is
/// running and the caller's responsibility (and this crate's) ends.
pub async fn bootstrap(config: RuntimeConfig, options: BootstrapOptions) -> NodeupResult<u32> {
    let invoker = BuildInvoker::new(".").with_timeout(options.build_timeout);
    let ctx = Arc::new(Mutex::new(BootContext::new(
        config,
        invoker,
        options.build_opts,
    )));
    run(ctx).await
}

/// Execute the plan against a prepared context.
async fn run(ctx: BootCtx) -> NodeupResult<u32> {
    let metrics = PipelineExecutor::execute(execution_plan(), Arc::clone(&ctx)).await?;
    metrics.log_summary();

    let ctx = ctx.lock().await;
    ctx.node_pid
        .ok_or_else(|| NodeupError::Internal("launch task did not record a PID".into()))
}
