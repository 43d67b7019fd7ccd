//! Data volume checks

use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::ResourceExt;

use super::ClusterRef;
use crate::crd::SearchCluster;
use crate::naming::{
    data_volume_claim_name, namespaced, pod_names, stateful_set_name, stateful_set_selector,
};
use crate::reader::StateReader;
use crate::{Error, Result};

/// Every pod of a node set with storage has a data claim of the requested class
///
/// Node sets without storage are skipped. When storage is declared without a
/// class, the claim only has to exist since the cluster default class applies.
/// Claims left behind by a scale-down are ignored.
pub async fn check_data_volume_type(
    cluster: &SearchCluster,
    reader: &dyn StateReader,
) -> Result<()> {
    let id = ClusterRef::of(cluster);

    for node_set in &cluster.spec.node_sets {
        let Some(storage) = &node_set.storage else {
            continue;
        };
        let sset = stateful_set_name(&id.name, &node_set.name);
        let claims = reader
            .list_volume_claims(&id.namespace, &stateful_set_selector(&sset))
            .await?;

        for pod in pod_names(&sset, node_set.count) {
            let name = data_volume_claim_name(&pod);
            let claim = claims
                .iter()
                .find(|c| c.name_any() == name)
                .ok_or_else(|| {
                    Error::not_found("PersistentVolumeClaim", namespaced(&id.namespace, &name))
                })?;

            if let Some(desired) = &storage.storage_class_name {
                let actual = storage_class(claim);
                if actual != desired.as_str() {
                    return Err(Error::mismatch(
                        format!("storage class of PersistentVolumeClaim {name}"),
                        desired,
                        actual,
                    ));
                }
            }
        }
    }
    Ok(())
}

fn storage_class(claim: &PersistentVolumeClaim) -> &str {
    claim
        .spec
        .as_ref()
        .and_then(|s| s.storage_class_name.as_deref())
        .unwrap_or("")
}
