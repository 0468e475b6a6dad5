//! Pipeline executor.

use std::time::Instant;

use futures::future::try_join_all;

use super::metrics::{PipelineMetrics, StageMetrics, TaskMetrics};
use super::stage::{ExecutionMode, Stage};
use super::task::BoxedTask;
use crate::errors::{NodeupError, NodeupResult};

/// An ordered list of stages to execute.
pub struct ExecutionPlan<Ctx> {
    stages: Vec<Stage<BoxedTask<Ctx>>>,
}

impl<Ctx> ExecutionPlan<Ctx> {
    pub fn new(stages: Vec<Stage<BoxedTask<Ctx>>>) -> Self {
        Self { stages }
    }

    fn into_stages(self) -> Vec<Stage<BoxedTask<Ctx>>> {
        self.stages
    }
}

/// Executes an [`ExecutionPlan`] stage by stage.
///
/// Each stage gates the next: a task error stops the run immediately and
/// no later stage or task is started.
pub struct PipelineExecutor;

impl PipelineExecutor {
    pub async fn execute<Ctx>(plan: ExecutionPlan<Ctx>, ctx: Ctx) -> NodeupResult<PipelineMetrics>
    where
        Ctx: Clone,
    {
        let total_start = Instant::now();
        let mut stage_metrics = Vec::new();

        for (index, stage) in plan.into_stages().into_iter().enumerate() {
            let execution = stage.execution;
            let stage_start = Instant::now();
            tracing::debug!(stage = index, mode = ?execution, "stage starting");

            let task_metrics = match execution {
                ExecutionMode::Sequential => {
                    let mut task_metrics = Vec::new();
                    for task in stage.tasks {
                        let name = task.name().to_string();
                        let task_start = Instant::now();
                        task.run(ctx.clone()).await?;
                        task_metrics.push(TaskMetrics {
                            name,
                            duration_ms: task_start.elapsed().as_millis(),
                        });
                    }
                    task_metrics
                }
                ExecutionMode::Parallel => {
                    let futures = stage.tasks.into_iter().map(|task| {
                        let ctx = ctx.clone();
                        async move {
                            let name = task.name().to_string();
                            let task_start = Instant::now();
                            task.run(ctx).await?;
                            Ok::<TaskMetrics, NodeupError>(TaskMetrics {
                                name,
                                duration_ms: task_start.elapsed().as_millis(),
                            })
                        }
                    });
                    try_join_all(futures).await?
                }
            };

            stage_metrics.push(StageMetrics {
                index,
                execution,
                duration_ms: stage_start.elapsed().as_millis(),
                tasks: task_metrics,
            });
        }

        Ok(PipelineMetrics {
            total_duration_ms: total_start.elapsed().as_millis(),
            stages: stage_metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineTask;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    struct RecordTask(&'static str);

    #[async_trait]
    impl PipelineTask<Trace> for RecordTask {
        async fn run(self: Box<Self>, ctx: Trace) -> NodeupResult<()> {
            ctx.lock().await.push(self.0);
            Ok(())
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    struct FailTask;

    #[async_trait]
    impl PipelineTask<Trace> for FailTask {
        async fn run(self: Box<Self>, _ctx: Trace) -> NodeupResult<()> {
            Err(NodeupError::Internal("boom".into()))
        }

        fn name(&self) -> &str {
            "fail"
        }
    }

    #[tokio::test]
    async fn sequential_stages_run_in_order() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let plan: ExecutionPlan<Trace> = ExecutionPlan::new(vec![
            Stage::sequential(vec![Box::new(RecordTask("a")), Box::new(RecordTask("b"))]),
            Stage::sequential(vec![Box::new(RecordTask("c"))]),
        ]);

        let metrics = PipelineExecutor::execute(plan, Arc::clone(&trace))
            .await
            .unwrap();

        assert_eq!(*trace.lock().await, vec!["a", "b", "c"]);
        assert_eq!(metrics.stages.len(), 2);
        assert!(metrics.task_duration_ms("b").is_some());
        assert!(metrics.task_duration_ms("missing").is_none());
    }

    #[tokio::test]
    async fn a_task_error_gates_later_stages() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let plan: ExecutionPlan<Trace> = ExecutionPlan::new(vec![
            Stage::sequential(vec![Box::new(RecordTask("a"))]),
            Stage::sequential(vec![Box::new(FailTask)]),
            Stage::sequential(vec![Box::new(RecordTask("never"))]),
        ]);

        let err = PipelineExecutor::execute(plan, Arc::clone(&trace))
            .await
            .unwrap_err();

        assert!(matches!(err, NodeupError::Internal(_)));
        assert_eq!(*trace.lock().await, vec!["a"]);
    }

    #[tokio::test]
    async fn parallel_stage_runs_all_tasks() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let plan: ExecutionPlan<Trace> = ExecutionPlan::new(vec![Stage::parallel(vec![
            Box::new(RecordTask("x")),
            Box::new(RecordTask("y")),
        ])]);

        let metrics = PipelineExecutor::execute(plan, Arc::clone(&trace))
            .await
            .unwrap();

        let mut ran = trace.lock().await.clone();
        ran.sort_unstable();
        assert_eq!(ran, vec!["x", "y"]);
        assert!(metrics.task_duration_ms("x").is_some());
        assert!(metrics.task_duration_ms("y").is_some());
    }
}
