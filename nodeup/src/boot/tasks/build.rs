//! Task: Build - produce an up-to-date node binary.

use async_trait::async_trait;

use super::{log_task_error, task_start};
use crate::boot::types::BootCtx;
use crate::errors::NodeupResult;
use crate::pipeline::PipelineTask;

pub struct BuildTask;

#[async_trait]
impl PipelineTask<BootCtx> for BuildTask {
    async fn run(self: Box<Self>, ctx: BootCtx) -> NodeupResult<()> {
        let task_name = self.name();
        task_start(task_name);

        let (invoker, build_opts) = {
            let ctx = ctx.lock().await;
            (ctx.invoker.clone(), ctx.build_opts.clone())
        };

        invoker
            .run(build_opts.as_deref())
            .await
            .inspect_err(|e| log_task_error(task_name, e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "build"
    }
}
