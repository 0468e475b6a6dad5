//! Task: Launch - create the mount directory and start the node.

use async_trait::async_trait;

use super::{log_task_error, task_start};
use crate::boot::types::BootCtx;
use crate::errors::NodeupResult;
use crate::launch;
use crate::pipeline::PipelineTask;

pub struct LaunchTask;

#[async_trait]
impl PipelineTask<BootCtx> for LaunchTask {
    async fn run(self: Box<Self>, ctx: BootCtx) -> NodeupResult<()> {
        let task_name = self.name();
        task_start(task_name);

        let config = {
            let ctx = ctx.lock().await;
            ctx.config.clone()
        };

        // Creation failure is fatal before any launch attempt
        launch::prepare_mount_dir(&config.mount_dir)
            .inspect_err(|e| log_task_error(task_name, e))?;

        let pid = launch::spawn_node(&config)
            .await
            .inspect_err(|e| log_task_error(task_name, e))?;

        ctx.lock().await.node_pid = Some(pid);
        Ok(())
    }

    fn name(&self) -> &str {
        "node_launch"
    }
}
