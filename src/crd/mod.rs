//! Custom Resource Definitions
//!
//! The SearchCluster resource is the desired state every check compares against.

mod cluster;
mod types;

pub use cluster::{SearchCluster, SearchClusterSpec, SearchClusterStatus};
pub use types::{
    ClusterHealth, HttpSpec, NodeResources, NodeSet, ServiceSpec, StorageSpec, TlsSpec,
    MAX_NODE_SET_COUNT,
};
