//! Task trait for pipeline execution.

use async_trait::async_trait;

use crate::errors::NodeupResult;

/// An atomic unit of pipeline work.
///
/// Tasks run against a shared context, cloned per task (use interior
/// mutability for writes). A task error aborts the pipeline; remaining
/// stages do not run.
#[async_trait]
pub trait PipelineTask<Ctx>: Send + Sync {
    /// Execute the task with the shared pipeline context.
    async fn run(self: Box<Self>, ctx: Ctx) -> NodeupResult<()>;

    /// Task name used in logs and metrics.
    fn name(&self) -> &str;
}

pub type BoxedTask<Ctx> = Box<dyn PipelineTask<Ctx>>;
