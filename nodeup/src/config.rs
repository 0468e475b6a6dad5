//! Runtime configuration for the bootstrap pipeline.
//!
//! The configuration is built once at startup and threaded by reference
//! through every later stage. The orchestrator never mutates its own
//! environment; the schema variables are applied to the launched node's
//! environment instead.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{NodeupError, NodeupResult};

/// Environment variable schema.
///
/// These names are the external contract: each is consumed as an override at
/// configuration time (when already set) and exported, resolved, into the
/// launched node's environment.
pub mod env_keys {
    pub const CONTROLLER_SOCKET_FILE: &str = "CONTROLLER_SOCKET_FILE";
    pub const NODE_SOCKET_FILE: &str = "NODE_SOCKET_FILE";
    pub const KV_SERVER_LIST: &str = "KV_SERVER_LIST";
    pub const MOUNT_HELPER_BIN: &str = "MOUNT_HELPER_BIN";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const RUST_BACKTRACE: &str = "RUST_BACKTRACE";
}

/// Fixed defaults for a local single-node bootstrap.
pub mod defaults {
    pub const CONTROLLER_SOCKET: &str = "/tmp/controller.sock";
    pub const NODE_SOCKET: &str = "/tmp/node.sock";
    pub const KV_SERVER_LIST: &str = "127.0.0.1:2379";
    pub const MOUNT_HELPER: &str = "target/debug/mount-helper";
    pub const MOUNT_DIR: &str = "/tmp/stornode_data";
    pub const NODE_BINARY: &str = "target/debug/stornode";
    pub const NODE_NAME: &str = "localhost";
    pub const CSI_DRIVER_NAME: &str = "io.nodeup.csi.plugin";
    pub const WORKER_PORT: u16 = 8089;
    pub const SERVER_PORT: u16 = 8800;
    pub const CACHE_CAPACITY: u64 = 1024 * 1024 * 1024;
    pub const S3_ACCESS_KEY_ID: &str = "minioadmin";
    pub const S3_SECRET_ACCESS_KEY: &str = "minioadmin";
    pub const S3_BUCKET: &str = "stornode-test";
    pub const S3_ENDPOINT_URL: &str = "http://127.0.0.1:9000";
    pub const STORAGE_TYPE: &str = "none";
    pub const LOG_LEVEL: &str = "debug";
    pub const BACKTRACE: &str = "full";
}

/// Object-storage backend parameters passed through to the node.
///
/// The defaults target a local MinIO instance; the orchestrator never
/// contacts the endpoint itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Params {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub endpoint_url: String,
}

/// Resolved runtime configuration (immutable after construction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// CSI controller socket path.
    pub controller_socket: PathBuf,
    /// CSI node socket path; the node's CSI endpoint is `unix://<this>`.
    pub node_socket: PathBuf,
    /// Backend key-value endpoint address (`host:port`).
    pub kv_server_list: String,
    /// FUSE mount helper binary, resolved to an absolute path.
    pub mount_helper: PathBuf,
    /// Local mount target for the node's filesystem.
    pub mount_dir: PathBuf,
    /// Node binary produced by the build stage.
    pub node_binary: PathBuf,
    pub node_name: String,
    pub node_ip: IpAddr,
    pub csi_driver_name: String,
    pub worker_port: u16,
    pub server_port: u16,
    /// Local cache capacity in bytes.
    pub cache_capacity: u64,
    pub s3: S3Params,
    /// Storage backend type selector ("none" or "s3").
    pub storage_type: String,
    /// Log verbosity exported to the node as RUST_LOG.
    pub log_level: String,
    /// Backtrace verbosity exported to the node as RUST_BACKTRACE.
    pub backtrace: String,
}

impl RuntimeConfig {
    /// Build the configuration from the process environment.
    ///
    /// Externally supplied values win over the fixed defaults. The mount
    /// helper path is resolved to an absolute path; a missing helper is a
    /// fatal resolution error.
    pub fn from_env() -> NodeupResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an explicit variable
    /// lookup, so construction is testable without touching the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> NodeupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mount_helper = PathBuf::from(var(env_keys::MOUNT_HELPER_BIN, defaults::MOUNT_HELPER));
        let mount_helper = std::fs::canonicalize(&mount_helper).map_err(|e| {
            NodeupError::Config(format!(
                "failed to resolve mount helper {}: {}",
                mount_helper.display(),
                e
            ))
        })?;

        Ok(Self {
            controller_socket: PathBuf::from(var(
                env_keys::CONTROLLER_SOCKET_FILE,
                defaults::CONTROLLER_SOCKET,
            )),
            node_socket: PathBuf::from(var(env_keys::NODE_SOCKET_FILE, defaults::NODE_SOCKET)),
            kv_server_list: var(env_keys::KV_SERVER_LIST, defaults::KV_SERVER_LIST),
            mount_helper,
            mount_dir: PathBuf::from(defaults::MOUNT_DIR),
            node_binary: PathBuf::from(defaults::NODE_BINARY),
            node_name: defaults::NODE_NAME.to_string(),
            node_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            csi_driver_name: defaults::CSI_DRIVER_NAME.to_string(),
            worker_port: defaults::WORKER_PORT,
            server_port: defaults::SERVER_PORT,
            cache_capacity: defaults::CACHE_CAPACITY,
            s3: S3Params {
                access_key_id: defaults::S3_ACCESS_KEY_ID.to_string(),
                secret_access_key: defaults::S3_SECRET_ACCESS_KEY.to_string(),
                bucket: defaults::S3_BUCKET.to_string(),
                endpoint_url: defaults::S3_ENDPOINT_URL.to_string(),
            },
            storage_type: defaults::STORAGE_TYPE.to_string(),
            log_level: var(env_keys::RUST_LOG, defaults::LOG_LEVEL),
            backtrace: var(env_keys::RUST_BACKTRACE, defaults::BACKTRACE),
        })
    }

    /// CSI endpoint URI for the node socket.
    pub fn csi_endpoint(&self) -> String {
        format!("unix://{}", self.node_socket.display())
    }

    /// Environment applied to the launched node process.
    ///
    /// This is the resolved schema of [`env_keys`]; the orchestrator's own
    /// environment is left untouched.
    pub fn child_env(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                env_keys::CONTROLLER_SOCKET_FILE,
                self.controller_socket.display().to_string(),
            ),
            (
                env_keys::NODE_SOCKET_FILE,
                self.node_socket.display().to_string(),
            ),
            (env_keys::KV_SERVER_LIST, self.kv_server_list.clone()),
            (
                env_keys::MOUNT_HELPER_BIN,
                self.mount_helper.display().to_string(),
            ),
            (env_keys::RUST_LOG, self.log_level.clone()),
            (env_keys::RUST_BACKTRACE, self.backtrace.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn helper_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("mount-helper");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"#!/bin/sh\n").unwrap();
        path
    }

    fn config_with(overrides: HashMap<&'static str, String>) -> NodeupResult<RuntimeConfig> {
        RuntimeConfig::from_lookup(|key| overrides.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let helper = helper_file(&dir);

        let mut overrides = HashMap::new();
        overrides.insert(env_keys::MOUNT_HELPER_BIN, helper.display().to_string());
        let config = config_with(overrides).unwrap();

        assert_eq!(config.controller_socket, PathBuf::from("/tmp/controller.sock"));
        assert_eq!(config.node_socket, PathBuf::from("/tmp/node.sock"));
        assert_eq!(config.kv_server_list, "127.0.0.1:2379");
        assert_eq!(config.storage_type, "none");
        assert_eq!(config.cache_capacity, 1073741824);
        assert_eq!(config.csi_endpoint(), "unix:///tmp/node.sock");
    }

    #[test]
    fn external_overrides_are_not_clobbered() {
        let dir = tempfile::tempdir().unwrap();
        let helper = helper_file(&dir);

        let mut overrides = HashMap::new();
        overrides.insert(env_keys::MOUNT_HELPER_BIN, helper.display().to_string());
        overrides.insert(env_keys::NODE_SOCKET_FILE, "/run/other.sock".to_string());
        overrides.insert(env_keys::KV_SERVER_LIST, "10.0.0.7:2379".to_string());
        overrides.insert(env_keys::RUST_LOG, "trace".to_string());
        let config = config_with(overrides).unwrap();

        assert_eq!(config.node_socket, PathBuf::from("/run/other.sock"));
        assert_eq!(config.kv_server_list, "10.0.0.7:2379");
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.csi_endpoint(), "unix:///run/other.sock");
    }

    #[test]
    fn missing_helper_is_a_resolution_error() {
        let mut overrides = HashMap::new();
        overrides.insert(
            env_keys::MOUNT_HELPER_BIN,
            "/nonexistent/path/mount-helper".to_string(),
        );
        let err = config_with(overrides).unwrap_err();
        assert!(matches!(err, NodeupError::Config(_)));
        assert!(err.to_string().contains("mount helper"));
    }

    #[test]
    fn helper_path_is_resolved_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let helper = helper_file(&dir);

        let mut overrides = HashMap::new();
        overrides.insert(env_keys::MOUNT_HELPER_BIN, helper.display().to_string());
        let config = config_with(overrides).unwrap();

        assert!(config.mount_helper.is_absolute());
        let exported = config.child_env();
        let helper_var = exported
            .iter()
            .find(|(key, _)| *key == env_keys::MOUNT_HELPER_BIN)
            .unwrap();
        assert_eq!(helper_var.1, config.mount_helper.display().to_string());
    }
}
