//! Certificate presence checks

use kube::ResourceExt;
use tracing::trace;

use super::ClusterRef;
use crate::crd::SearchCluster;
use crate::naming::{cluster_selector, CaKind};
use crate::reader::StateReader;
use crate::{Error, Result};

/// Both the transport and the HTTP certificate authority load and may sign
pub async fn check_certificate_authorities(
    cluster: &SearchCluster,
    reader: &dyn StateReader,
) -> Result<()> {
    let id = ClusterRef::of(cluster);
    for kind in [CaKind::Transport, CaKind::Http] {
        let ca = reader.get_ca(&id.namespace, &id.name, kind).await?;
        let info = ca.cert_info();
        if !info.is_ca {
            return Err(Error::mismatch(
                format!("basic constraints of {kind} CA {}", info.common_name),
                "CA:TRUE",
                "CA:FALSE",
            ));
        }
    }
    Ok(())
}

/// Every pod of the cluster has a loadable transport certificate
pub async fn check_instance_certificates(
    cluster: &SearchCluster,
    reader: &dyn StateReader,
) -> Result<()> {
    let id = ClusterRef::of(cluster);
    let pods = reader
        .list_instances(&id.namespace, &cluster_selector(&id.name))
        .await?;
    for pod in &pods {
        let cert = reader
            .get_transport_cert(&id.namespace, &id.name, &pod.name_any())
            .await?;
        trace!(
            pod = %pod.name_any(),
            subject = %cert.cert_info().common_name,
            "transport certificate loaded"
        );
    }
    Ok(())
}
