//! Single-attempt predicates comparing observed and desired state
//!
//! Each predicate reads the store once and returns `Ok(())` when the observed
//! state satisfies its condition against the desired [`SearchCluster`], or the
//! error describing the first discrepancy. Predicates never retry or sleep;
//! wrap them with [`crate::retry::eventually`] to wait for convergence.
//!
//! [`Check`] names a predicate as plain data so checklists can be built,
//! listed and logged without capturing closures.

mod certificates;
mod cluster;
mod instances;
mod services;
mod volumes;

pub use certificates::{check_certificate_authorities, check_instance_certificates};
pub use cluster::{check_admin_password, check_cluster_health};
pub use instances::{
    check_expected_instances_ready, check_group_replicas, check_instances_phase, check_version,
    on_all_instances,
};
pub use services::{
    check_endpoint_counts, check_endpoints, check_services, expected_endpoints,
    expected_services,
};
pub use volumes::check_data_volume_type;

use kube::ResourceExt;

use crate::annotate::{annotate_instances, check_annotations_visible};
use crate::crd::SearchCluster;
use crate::reader::StateReader;
use crate::Result;

/// Namespace used when a cluster object carries none
const DEFAULT_NAMESPACE: &str = "default";

/// Namespace and name of a cluster, resolved once per predicate
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ClusterRef {
    pub namespace: String,
    pub name: String,
}

impl ClusterRef {
    pub fn of(cluster: &SearchCluster) -> Self {
        Self {
            namespace: cluster
                .namespace()
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            name: cluster.name_any(),
        }
    }
}

/// A named predicate over a cluster and the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Check {
    /// [`check_certificate_authorities`]
    CertificateAuthorities,
    /// [`check_instance_certificates`]
    InstanceCertificates,
    /// [`check_expected_instances_ready`]
    ExpectedInstancesReady,
    /// [`check_version`]
    Version,
    /// [`check_instances_phase`] with the given phase
    InstancesInPhase(String),
    /// [`check_group_replicas`]
    GroupReplicas,
    /// [`check_cluster_health`]
    ClusterHealth,
    /// [`check_services`]
    Services,
    /// [`check_endpoints`]
    ServiceEndpoints,
    /// [`check_admin_password`]
    AdminPassword,
    /// [`check_data_volume_type`]
    DataVolumeType,
    /// [`annotate_instances`]; a write, but retried like any predicate
    AnnotateInstances,
    /// [`check_annotations_visible`]
    InstanceAnnotationsVisible,
}

impl Check {
    /// Make one attempt at the named predicate
    pub async fn evaluate(&self, cluster: &SearchCluster, reader: &dyn StateReader) -> Result<()> {
        match self {
            Check::CertificateAuthorities => check_certificate_authorities(cluster, reader).await,
            Check::InstanceCertificates => check_instance_certificates(cluster, reader).await,
            Check::ExpectedInstancesReady => check_expected_instances_ready(cluster, reader).await,
            Check::Version => check_version(cluster, reader).await,
            Check::InstancesInPhase(phase) => check_instances_phase(cluster, reader, phase).await,
            Check::GroupReplicas => check_group_replicas(cluster, reader).await,
            Check::ClusterHealth => check_cluster_health(cluster, reader).await,
            Check::Services => check_services(cluster, reader).await,
            Check::ServiceEndpoints => check_endpoints(cluster, reader).await,
            Check::AdminPassword => check_admin_password(cluster, reader).await,
            Check::DataVolumeType => check_data_volume_type(cluster, reader).await,
            Check::AnnotateInstances => annotate_instances(cluster, reader).await,
            Check::InstanceAnnotationsVisible => check_annotations_visible(cluster, reader).await,
        }
    }
}
