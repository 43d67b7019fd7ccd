//! Resource names and label selectors derived from a SearchCluster
//!
//! These mirror the conventions the operator uses when it creates resources, so
//! the checks can compute what *should* exist without asking the operator.

use std::fmt;

use crate::{CLUSTER_NAME_LABEL, STATEFULSET_NAME_LABEL};

/// Data key holding a certificate in a TLS secret
pub const CERT_KEY: &str = "tls.crt";

/// Data key holding a private key in a TLS secret
pub const PRIVATE_KEY_KEY: &str = "tls.key";

/// Name of the volume claim template holding node data
pub const DATA_VOLUME_NAME: &str = "search-data";

/// Built-in administrative user whose password the operator generates
pub const ADMIN_USERNAME: &str = "admin";

/// Which certificate authority of a cluster to load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaKind {
    /// CA signing node-to-node transport certificates
    Transport,
    /// CA signing the externally facing HTTP certificate
    Http,
}

impl fmt::Display for CaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Name of the StatefulSet backing a node set
pub fn stateful_set_name(cluster: &str, node_set: &str) -> String {
    format!("{cluster}-sc-{node_set}")
}

/// Names of the pods a StatefulSet with `replicas` replicas creates
pub fn pod_names(stateful_set: &str, replicas: u32) -> Vec<String> {
    (0..replicas)
        .map(|ordinal| format!("{stateful_set}-{ordinal}"))
        .collect()
}

/// Name of the HTTP service of a cluster
pub fn http_service_name(cluster: &str) -> String {
    format!("{cluster}-sc-http")
}

/// Name of the secret holding a cluster CA certificate and key
pub fn ca_secret_name(cluster: &str, kind: CaKind) -> String {
    format!("{cluster}-sc-{kind}-ca-internal")
}

/// Name of the secret holding every pod's transport certificate
pub fn transport_certs_secret_name(cluster: &str) -> String {
    format!("{cluster}-sc-transport-certs")
}

/// Secret data keys (certificate, private key) for one pod's transport certificate
pub fn transport_cert_keys(pod: &str) -> (String, String) {
    (format!("{pod}.{CERT_KEY}"), format!("{pod}.{PRIVATE_KEY_KEY}"))
}

/// Name of the data volume claim a StatefulSet creates for a pod
pub fn data_volume_claim_name(pod: &str) -> String {
    format!("{DATA_VOLUME_NAME}-{pod}")
}

/// Name of the secret holding the administrative user's password
pub fn admin_user_secret_name(cluster: &str) -> String {
    format!("{cluster}-sc-{ADMIN_USERNAME}-user")
}

/// Label selector matching every pod or StatefulSet of a cluster
pub fn cluster_selector(cluster: &str) -> String {
    format!("{CLUSTER_NAME_LABEL}={cluster}")
}

/// Label selector matching the pods of one StatefulSet
pub fn stateful_set_selector(stateful_set: &str) -> String {
    format!("{STATEFULSET_NAME_LABEL}={stateful_set}")
}

/// `namespace/name` as used in error messages
pub fn namespaced(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}
