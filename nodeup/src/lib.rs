//! Local bootstrap orchestrator for a stornode storage node.
//!
//! One invocation takes a source tree to a running, locally-mounted
//! storage node: resolve configuration, reconcile stale mount state,
//! build the node binary, create the mount directory, and launch the
//! node with its fixed flag set. The node's internals (FUSE engine, CSI,
//! caching, S3 backend, etcd metadata) are an external collaborator,
//! invoked only as an opaque executable.

pub mod boot;
pub mod build;
pub mod config;
pub mod errors;
pub mod launch;
pub mod logging;
pub mod mount;
pub mod pipeline;
pub mod util;

pub use config::RuntimeConfig;
pub use errors::{NodeupError, NodeupResult};
