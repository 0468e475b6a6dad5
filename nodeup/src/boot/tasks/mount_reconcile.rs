//! Task: Mount reconciliation - bring the mount directory to a clean state.

use async_trait::async_trait;

use super::{log_task_error, task_start};
use crate::boot::types::BootCtx;
use crate::errors::NodeupResult;
use crate::mount;
use crate::pipeline::PipelineTask;

pub struct MountReconcileTask;

#[async_trait]
impl PipelineTask<BootCtx> for MountReconcileTask {
    async fn run(self: Box<Self>, ctx: BootCtx) -> NodeupResult<()> {
        let task_name = self.name();
        task_start(task_name);

        let mount_dir = {
            let ctx = ctx.lock().await;
            ctx.config.mount_dir.clone()
        };

        mount::reconcile(&mount_dir).inspect_err(|e| log_task_error(task_name, e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "mount_reconcile"
    }
}
