//! Pod-level checks: the exact set of pods, their readiness, version, phase,
//! and whether a rolling upgrade has reached them

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::trace;

use super::ClusterRef;
use crate::crd::SearchCluster;
use crate::fingerprint::node_set_fingerprint;
use crate::kube_utils::{annotation, is_pod_ready, label, pod_phase, sorted_names, status_json};
use crate::naming::{cluster_selector, pod_names, stateful_set_name, stateful_set_selector};
use crate::reader::StateReader;
use crate::{Error, Result, FINGERPRINT_ANNOTATION, VERSION_LABEL};

/// Replica count Kubernetes assumes when a StatefulSet leaves it unset
const DEFAULT_REPLICAS: i32 = 1;

/// Apply a condition to every pod, stopping at the first failure
pub fn on_all_instances<F>(pods: &[Pod], condition: F) -> Result<()>
where
    F: FnMut(&Pod) -> Result<()>,
{
    pods.iter().try_for_each(condition)
}

/// List the cluster's pods and require exactly `node_count()` of them
async fn list_expected_count(
    cluster: &SearchCluster,
    reader: &dyn StateReader,
) -> Result<Vec<Pod>> {
    let id = ClusterRef::of(cluster);
    let pods = reader
        .list_instances(&id.namespace, &cluster_selector(&id.name))
        .await?;

    let expected = cluster.spec.node_count();
    if pods.len() as u64 != expected {
        return Err(Error::mismatch(
            format!("number of pods of {}", id.name),
            expected,
            pods.len(),
        ));
    }
    Ok(pods)
}

/// Every pod runs the desired version, and there are as many pods as desired
pub async fn check_version(cluster: &SearchCluster, reader: &dyn StateReader) -> Result<()> {
    let pods = list_expected_count(cluster, reader).await?;
    let desired = cluster.spec.version.as_str();

    on_all_instances(&pods, |pod| {
        let version = label(pod, VERSION_LABEL);
        if version != desired {
            return Err(Error::mismatch(
                format!("version of pod {}", pod.name_any()),
                desired,
                version,
            ));
        }
        Ok(())
    })
}

/// Every pod is in the given lifecycle phase, and there are as many pods as desired
pub async fn check_instances_phase(
    cluster: &SearchCluster,
    reader: &dyn StateReader,
    phase: &str,
) -> Result<()> {
    let pods = list_expected_count(cluster, reader).await?;

    on_all_instances(&pods, |pod| {
        let actual = pod_phase(pod);
        if actual != phase {
            return Err(Error::mismatch(
                format!("phase of pod {}", pod.name_any()),
                phase,
                actual,
            ));
        }
        Ok(())
    })
}

/// The StatefulSets of the cluster are exactly one per node set, with the
/// node set's count as replicas
pub async fn check_group_replicas(
    cluster: &SearchCluster,
    reader: &dyn StateReader,
) -> Result<()> {
    let id = ClusterRef::of(cluster);

    let expected = cluster
        .spec
        .node_sets
        .iter()
        .map(|ns| {
            let replicas = i32::try_from(ns.count).map_err(|_| {
                Error::validation(format!(
                    "node set '{}' count {} does not fit in StatefulSet replicas",
                    ns.name, ns.count
                ))
            })?;
            Ok((stateful_set_name(&id.name, &ns.name), replicas))
        })
        .collect::<Result<BTreeMap<String, i32>>>()?;

    let actual: BTreeMap<String, i32> = reader
        .get_group_records(&id.namespace, &id.name)
        .await?
        .iter()
        .map(|sset| {
            let replicas = sset
                .spec
                .as_ref()
                .and_then(|s| s.replicas)
                .unwrap_or(DEFAULT_REPLICAS);
            (sset.name_any(), replicas)
        })
        .collect();

    if expected != actual {
        return Err(Error::mismatch(
            "StatefulSets",
            format!("{expected:?}"),
            format!("{actual:?}"),
        ));
    }
    Ok(())
}

/// Exactly the expected pods exist, all Ready, none left on a previous spec
///
/// Per node set, the pod names the StatefulSet should own are compared with the
/// ones observed as sorted sequences, so a leftover pod from a renamed node set
/// fails even when the counts match.
///
/// A pod with no fingerprint annotation is accepted: it was recreated since the
/// last stamp or the cluster was never mutated. This also means a rollout that
/// skipped stamping a pod entirely goes unnoticed.
pub async fn check_expected_instances_ready(
    cluster: &SearchCluster,
    reader: &dyn StateReader,
) -> Result<()> {
    check_group_replicas(cluster, reader).await?;

    let id = ClusterRef::of(cluster);
    for node_set in &cluster.spec.node_sets {
        let sset = stateful_set_name(&id.name, &node_set.name);

        let mut expected = pod_names(&sset, node_set.count);
        expected.sort();
        let pods = reader
            .list_instances(&id.namespace, &stateful_set_selector(&sset))
            .await?;
        let actual = sorted_names(&pods);

        if expected != actual {
            return Err(Error::mismatch(
                format!("pods of StatefulSet {sset}"),
                format!("{expected:?}"),
                format!("{actual:?}"),
            ));
        }

        let fingerprint = node_set_fingerprint(&cluster.spec, node_set)?;
        for pod in &pods {
            if !is_pod_ready(pod) {
                return Err(Error::instance_not_ready(pod.name_any(), status_json(pod)?));
            }

            let stamped = annotation(pod, FINGERPRINT_ANNOTATION);
            if !stamped.is_empty() && stamped != fingerprint {
                return Err(Error::stale_instance(pod.name_any(), &fingerprint, stamped));
            }
        }
        trace!(stateful_set = %sset, pods = pods.len(), "node set converged");
    }
    Ok(())
}
