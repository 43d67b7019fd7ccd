//! Stamping pods with the fingerprint of the spec they run
//!
//! Annotating a pod forces the store to propagate a fresh version of it, which
//! is how a test makes sure later reads do not come from a stale cache. It runs
//! in two phases, each a step of its own:
//!
//! 1. [`annotate_instances`] writes the current fingerprint of its node set to
//!    every pod. Any failure, including a lost write race, aborts the attempt
//!    and the whole phase re-runs.
//! 2. [`check_annotations_visible`] waits until every pod reads back with a
//!    non-empty annotation.
//!
//! Phase 2 only confirms that some value is visible. It cannot tell a lagging
//! cache from a write that never landed; a pod that reads back with the
//! previous fingerprint counts as visible.

use std::collections::BTreeMap;

use kube::ResourceExt;
use tracing::{debug, info};

use crate::checks::ClusterRef;
use crate::crd::SearchCluster;
use crate::fingerprint::node_set_fingerprint;
use crate::kube_utils::annotation;
use crate::naming::{cluster_selector, stateful_set_name, stateful_set_selector};
use crate::reader::StateReader;
use crate::{Error, Result, FINGERPRINT_ANNOTATION};

/// Write the current fingerprint of each node set to all of its pods
///
/// Pods already carrying the current value are left untouched.
pub async fn annotate_instances(cluster: &SearchCluster, reader: &dyn StateReader) -> Result<()> {
    let id = ClusterRef::of(cluster);

    for node_set in &cluster.spec.node_sets {
        let fingerprint = node_set_fingerprint(&cluster.spec, node_set)?;
        let sset = stateful_set_name(&id.name, &node_set.name);
        let pods = reader
            .list_instances(&id.namespace, &stateful_set_selector(&sset))
            .await?;

        let mut updated = 0usize;
        for mut pod in pods {
            if annotation(&pod, FINGERPRINT_ANNOTATION) == fingerprint {
                continue;
            }
            pod.annotations_mut()
                .insert(FINGERPRINT_ANNOTATION.to_string(), fingerprint.clone());
            reader.update_instance(&pod).await?;
            debug!(pod = %pod.name_any(), fingerprint = %fingerprint, "annotated pod");
            updated += 1;
        }

        info!(
            stateful_set = %sset,
            fingerprint = %fingerprint,
            updated,
            "node set annotated"
        );
    }
    Ok(())
}

/// Every pod of the cluster reads back with a non-empty fingerprint annotation
pub async fn check_annotations_visible(
    cluster: &SearchCluster,
    reader: &dyn StateReader,
) -> Result<()> {
    let id = ClusterRef::of(cluster);
    let pods = reader
        .list_instances(&id.namespace, &cluster_selector(&id.name))
        .await?;

    for pod in &pods {
        if annotation(pod, FINGERPRINT_ANNOTATION).is_empty() {
            return Err(Error::mismatch(
                format!("annotation {FINGERPRINT_ANNOTATION} of pod {}", pod.name_any()),
                "a fingerprint",
                "none",
            ));
        }
    }
    Ok(())
}

/// Current fingerprint of every node set, keyed by StatefulSet name
pub fn expected_fingerprints(cluster: &SearchCluster) -> Result<BTreeMap<String, String>> {
    let id = ClusterRef::of(cluster);
    cluster
        .spec
        .node_sets
        .iter()
        .map(|ns| {
            Ok((
                stateful_set_name(&id.name, &ns.name),
                node_set_fingerprint(&cluster.spec, ns)?,
            ))
        })
        .collect()
}
