//! Shared fixtures for unit tests

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, Pod, PodCondition, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};

use crate::crd::{HttpSpec, NodeSet, SearchCluster, SearchClusterSpec};
use crate::{CLUSTER_NAME_LABEL, FINGERPRINT_ANNOTATION, STATEFULSET_NAME_LABEL, VERSION_LABEL};

pub const NAMESPACE: &str = "observability";
pub const CLUSTER: &str = "logs";
pub const VERSION: &str = "8.11.1";

/// A cluster named `logs` with the given node sets
pub fn sample_cluster(node_sets: Vec<NodeSet>) -> SearchCluster {
    let mut cluster = SearchCluster::new(
        CLUSTER,
        SearchClusterSpec {
            version: VERSION.to_string(),
            http: HttpSpec::default(),
            node_sets,
        },
    );
    cluster.metadata.namespace = Some(NAMESPACE.to_string());
    cluster
}

/// A pod of the sample cluster, Ready when `ready` is set
pub fn pod(name: &str, stateful_set: &str, ready: bool) -> Pod {
    let labels = BTreeMap::from([
        (CLUSTER_NAME_LABEL.to_string(), CLUSTER.to_string()),
        (STATEFULSET_NAME_LABEL.to_string(), stateful_set.to_string()),
        (VERSION_LABEL.to_string(), VERSION.to_string()),
    ]);
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: None,
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            conditions: Some(vec![PodCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

/// Ready pods `{stateful_set}-0 .. {stateful_set}-(count-1)`
pub fn ready_pods(stateful_set: &str, count: u32) -> Vec<Pod> {
    crate::naming::pod_names(stateful_set, count)
        .iter()
        .map(|name| pod(name, stateful_set, true))
        .collect()
}

/// Stamp a pod with a fingerprint annotation
pub fn with_fingerprint(mut pod: Pod, fingerprint: &str) -> Pod {
    pod.metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(FINGERPRINT_ANNOTATION.to_string(), fingerprint.to_string());
    pod
}

/// A StatefulSet of the sample cluster with the given replica count
pub fn stateful_set(name: &str, replicas: i32) -> StatefulSet {
    StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            labels: Some(BTreeMap::from([(
                CLUSTER_NAME_LABEL.to_string(),
                CLUSTER.to_string(),
            )])),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(replicas),
            ..Default::default()
        }),
        status: None,
    }
}

/// A bound data volume claim with the given storage class
pub fn volume_claim(name: &str, storage_class: Option<&str>) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            storage_class_name: storage_class.map(str::to_string),
            ..Default::default()
        }),
        status: None,
    }
}

fn generate_pem(common_name: &str, is_ca: bool) -> (String, String) {
    let mut params = CertificateParams::new(vec![common_name.to_string()])
        .expect("valid certificate params");
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    if is_ca {
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    }
    let key_pair = KeyPair::generate().expect("generate key pair");
    let cert = params.self_signed(&key_pair).expect("self-sign certificate");
    (cert.pem(), key_pair.serialize_pem())
}

/// Self-signed CA certificate and key in PEM format
pub fn generate_ca_pem(common_name: &str) -> (String, String) {
    generate_pem(common_name, true)
}

/// Self-signed leaf certificate and key in PEM format
pub fn generate_leaf_pem(common_name: &str) -> (String, String) {
    generate_pem(common_name, false)
}
