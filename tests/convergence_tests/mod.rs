//! Integration tests for lattice-verify
//!
//! Tests are organized by the story they tell:
//!
//! - `checklist`: Stories about the standard checklist waiting for a cluster
//!   the operator is still building, and naming the step that never converges
//!
//! - `rollout`: Stories about mutating a cluster spec, stamping pods with their
//!   fingerprint, and catching pods the rollout has not reached yet
//!
//! `fake_store` holds the lagging in-memory store both stories run against.

mod checklist;
mod rollout;

use lattice_verify::crd::{NodeSet, SearchCluster, SearchClusterSpec};

use fake_store::NAMESPACE;

/// A SearchCluster named `logs` in the test namespace
pub fn search_cluster(version: &str, node_sets: Vec<NodeSet>) -> SearchCluster {
    let mut cluster = SearchCluster::new(
        "logs",
        SearchClusterSpec {
            version: version.to_string(),
            http: Default::default(),
            node_sets,
        },
    );
    cluster.metadata.namespace = Some(NAMESPACE.to_string());
    cluster
}
