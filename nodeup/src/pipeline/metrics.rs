//! Wall-clock accounting for pipeline runs.

use crate::pipeline::ExecutionMode;

#[derive(Debug, Clone)]
pub struct TaskMetrics {
    pub name: String,
    pub duration_ms: u128,
}

#[derive(Debug, Clone)]
pub struct StageMetrics {
    pub index: usize,
    pub execution: ExecutionMode,
    pub duration_ms: u128,
    pub tasks: Vec<TaskMetrics>,
}

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_duration_ms: u128,
    pub stages: Vec<StageMetrics>,
}

impl PipelineMetrics {
    /// Duration of a task by name, if it ran.
    pub fn task_duration_ms(&self, name: &str) -> Option<u128> {
        self.stages
            .iter()
            .flat_map(|stage| stage.tasks.iter())
            .find(|task| task.name == name)
            .map(|task| task.duration_ms)
    }

    /// Log per-task and total durations.
    pub fn log_summary(&self) {
        for stage in &self.stages {
            for task in &stage.tasks {
                tracing::debug!(
                    task = %task.name,
                    duration_ms = task.duration_ms as u64,
                    "task timing"
                );
            }
        }
        tracing::info!(
            total_ms = self.total_duration_ms as u64,
            "pipeline complete"
        );
    }
}
