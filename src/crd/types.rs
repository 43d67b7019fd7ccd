//! Supporting types for the SearchCluster CRD

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Largest node set count a StatefulSet can hold (`spec.replicas` is an `i32`)
pub const MAX_NODE_SET_COUNT: u32 = i32::MAX as u32;

/// A named group of search nodes sharing one configuration
///
/// Each node set is backed by exactly one StatefulSet. Only `count` may change
/// without replacing the existing pods.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSet {
    /// Name of the node set, unique within the cluster
    pub name: String,

    /// Desired number of pods
    #[serde(default)]
    pub count: u32,

    /// Search engine settings applied to every node of the set
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,

    /// Compute resources for each node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<NodeResources>,

    /// Persistent data volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSpec>,
}

impl NodeSet {
    /// Create a node set with the given name and count and no extra settings
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            ..Default::default()
        }
    }
}

/// Compute resources requested by each node
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct NodeResources {
    /// CPU quantity (e.g. "2", "500m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    /// Memory quantity (e.g. "4Gi")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Persistent volume claim settings for node data
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    /// Requested volume size (e.g. "10Gi")
    pub size: String,

    /// Storage class, cluster default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

/// HTTP exposure of the cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct HttpSpec {
    /// Service fronting the HTTP layer
    #[serde(default)]
    pub service: ServiceSpec,

    /// TLS settings for the HTTP layer
    #[serde(default)]
    pub tls: TlsSpec,
}

/// Service exposure configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ServiceSpec {
    /// Service type (LoadBalancer, NodePort, ClusterIP)
    #[serde(rename = "type", default = "default_service_type")]
    pub type_: String,
}

impl Default for ServiceSpec {
    fn default() -> Self {
        Self {
            type_: default_service_type(),
        }
    }
}

fn default_service_type() -> String {
    "ClusterIP".to_string()
}

/// TLS configuration for the HTTP layer
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TlsSpec {
    /// Serve plain HTTP instead of a self-signed certificate
    #[serde(default)]
    pub self_signed_disabled: bool,

    /// Extra subject alternative names for the HTTP certificate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alt_names: Vec<String>,
}

/// Health reported by the search cluster itself
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClusterHealth {
    /// All shards allocated
    Green,
    /// Primaries allocated, some replicas missing
    Yellow,
    /// Some primaries unallocated
    Red,
    /// Health not reported yet
    #[default]
    Unknown,
}

impl std::fmt::Display for ClusterHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
            Self::Red => write!(f, "red"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
