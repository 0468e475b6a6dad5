//! Mount-directory creation and node process launch.
//!
//! Launch is an explicit hand-off: the node is spawned as a child with
//! inherited stdio, confirmed started, and left running. The orchestrator's
//! responsibility ends there; no supervision follows.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::errors::{NodeupError, NodeupResult};
use crate::util::{command_matches, is_process_alive, kill_process};

/// Grace period before the spawned node is checked for an early exit.
const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Create the mount directory.
///
/// The create is non-recursive; the parent is assumed to exist. Failure
/// (path collision, permission) is fatal and no launch is attempted.
pub fn prepare_mount_dir(dir: &Path) -> NodeupResult<()> {
    std::fs::create_dir(dir).map_err(|e| {
        NodeupError::Launch(format!(
            "failed to create mount directory {}: {}",
            dir.display(),
            e
        ))
    })
}

/// The fixed, literal argument set the node is started with.
///
/// This is the node's CLI contract and must be reproduced exactly.
pub fn node_args(config: &RuntimeConfig) -> Vec<String> {
    vec![
        "--role=node".to_string(),
        format!("--csi-endpoint={}", config.csi_endpoint()),
        format!("--worker-port={}", config.worker_port),
        format!("--node-name={}", config.node_name),
        format!("--node-ip={}", config.node_ip),
        format!("--csi-driver-name={}", config.csi_driver_name),
        format!("--mount-path={}", config.mount_dir.display()),
        format!("--kv-server-list={}", config.kv_server_list),
        format!("--storage-s3-access-key-id={}", config.s3.access_key_id),
        format!(
            "--storage-s3-secret-access-key={}",
            config.s3.secret_access_key
        ),
        format!("--storage-s3-bucket={}", config.s3.bucket),
        format!("--storage-s3-endpoint-url={}", config.s3.endpoint_url),
        format!("--cache-capacity={}", config.cache_capacity),
        format!("--server-port={}", config.server_port),
        format!("--storage-type={}", config.storage_type),
    ]
}

/// Spawn the node binary and confirm it started.
///
/// The child inherits stdio and receives the resolved environment schema.
/// Confirmation means: still alive after [`STARTUP_GRACE`] and its command
/// line is the node binary we launched. On confirmation failure the child
/// is killed and the stage fails. Returns the node PID.
pub async fn spawn_node(config: &RuntimeConfig) -> NodeupResult<u32> {
    let args = node_args(config);
    info!(binary = %config.node_binary.display(), "launching storage node");

    let mut cmd = Command::new(&config.node_binary);
    cmd.args(&args);
    for (key, value) in config.child_env() {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(|e| {
        NodeupError::Launch(format!(
            "failed to spawn {}: {}",
            config.node_binary.display(),
            e
        ))
    })?;
    let pid = child
        .id()
        .ok_or_else(|| NodeupError::Internal("spawned node has no PID".into()))?;

    tokio::time::sleep(STARTUP_GRACE).await;

    if let Some(status) = child.try_wait().map_err(|e| {
        NodeupError::Launch(format!("failed to poll node process: {}", e))
    })? {
        return Err(NodeupError::Launch(format!(
            "node exited during startup with {}",
            status
        )));
    }

    if !confirm_node(pid, &config.node_binary) {
        kill_process(pid);
        return Err(NodeupError::Launch(format!(
            "PID {} is not the launched node binary",
            pid
        )));
    }

    info!(
        pid,
        mount_path = %config.mount_dir.display(),
        "storage node started, handing off"
    );
    Ok(pid)
}

/// Verify the PID still belongs to the binary we launched.
fn confirm_node(pid: u32, binary: &Path) -> bool {
    let Some(name) = binary.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    is_process_alive(pid) && command_matches(pid, name)
}
