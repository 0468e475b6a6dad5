//! Bootstrap pipeline tasks.

mod build;
mod launch;
mod mount_reconcile;

pub(crate) use build::BuildTask;
pub(crate) use launch::LaunchTask;
pub(crate) use mount_reconcile::MountReconcileTask;

use crate::errors::NodeupError;

pub(super) fn task_start(name: &str) {
    tracing::debug!(task = name, "task starting");
}

pub(super) fn log_task_error(name: &str, err: &NodeupError) {
    tracing::error!(task = name, error = %err, "task failed");
}
