//! Stage definitions.

/// How a stage runs its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// All tasks concurrently; the stage completes when every task has.
    Parallel,
    /// One task after another, in declaration order.
    Sequential,
}

/// A group of tasks sharing an execution mode.
///
/// Stages run strictly in plan order: a stage starts only after the
/// previous one finished successfully.
#[derive(Debug, Clone)]
pub struct Stage<T> {
    pub tasks: Vec<T>,
    pub execution: ExecutionMode,
}

impl<T> Stage<T> {
    pub fn parallel(tasks: Vec<T>) -> Self {
        Self {
            tasks,
            execution: ExecutionMode::Parallel,
        }
    }

    pub fn sequential(tasks: Vec<T>) -> Self {
        Self {
            tasks,
            execution: ExecutionMode::Sequential,
        }
    }
}
