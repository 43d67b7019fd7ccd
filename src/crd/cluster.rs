//! SearchCluster Custom Resource Definition
//!
//! A SearchCluster describes a search engine deployment: its version, how it is
//! exposed over HTTP, and the node sets that make it up.

use std::collections::BTreeSet;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{ClusterHealth, HttpSpec, NodeSet, MAX_NODE_SET_COUNT};

/// Specification for a SearchCluster
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "search.lattice.dev",
    version = "v1alpha1",
    kind = "SearchCluster",
    plural = "searchclusters",
    shortname = "sc",
    status = "SearchClusterStatus",
    namespaced,
    printcolumn = r#"{"name":"Health","type":"string","jsonPath":".status.health"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SearchClusterSpec {
    /// Search engine version every node should run
    pub version: String,

    /// HTTP exposure configuration
    #[serde(default)]
    pub http: HttpSpec,

    /// Node sets, in declaration order
    pub node_sets: Vec<NodeSet>,
}

impl SearchClusterSpec {
    /// Total number of pods across all node sets
    ///
    /// Summed as `u64` so any number of `u32` counts fits.
    pub fn node_count(&self) -> u64 {
        self.node_sets.iter().map(|ns| u64::from(ns.count)).sum()
    }

    /// Validate the cluster specification
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.version.is_empty() {
            return Err(crate::Error::validation("version must not be empty"));
        }
        if self.node_sets.is_empty() {
            return Err(crate::Error::validation("at least one node set is required"));
        }

        let mut seen = BTreeSet::new();
        for node_set in &self.node_sets {
            if node_set.name.is_empty() {
                return Err(crate::Error::validation("node set name must not be empty"));
            }
            if !seen.insert(node_set.name.as_str()) {
                return Err(crate::Error::validation(format!(
                    "duplicate node set name '{}'",
                    node_set.name
                )));
            }
            if node_set.count > MAX_NODE_SET_COUNT {
                return Err(crate::Error::validation(format!(
                    "node set '{}' count {} exceeds the StatefulSet replica limit {}",
                    node_set.name, node_set.count, MAX_NODE_SET_COUNT
                )));
            }
        }
        Ok(())
    }
}

/// Status for a SearchCluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchClusterStatus {
    /// Health reported by the cluster
    #[serde(default)]
    pub health: ClusterHealth,
}

impl SearchClusterStatus {
    /// Create a status with the given health
    pub fn with_health(health: ClusterHealth) -> Self {
        Self { health }
    }
}
