//! Read/update facade over the Kubernetes API
//!
//! Every method is a single typed call with no retry. Reads come from an
//! eventually consistent store: two reads a moment apart may disagree, and a
//! write may not be visible to the next read. Retrying is the job of
//! [`crate::retry::eventually`].

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Endpoints, PersistentVolumeClaim, Pod, Secret, Service};
use kube::api::{Api, ListParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::{debug, trace};

#[cfg(test)]
use mockall::automock;

use crate::crd::SearchCluster;
use crate::kube_utils::classify_api_error;
use crate::naming::{
    ca_secret_name, cluster_selector, namespaced, transport_cert_keys,
    transport_certs_secret_name, CaKind, CERT_KEY, PRIVATE_KEY_KEY,
};
use crate::pki::{CertificateAuthority, TransportCertificate};
use crate::Error;

/// Trait abstracting the cluster-state store for the checks
///
/// This trait allows mocking the Kubernetes API in tests while using the real
/// client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateReader: Send + Sync {
    /// Load one of the cluster's certificate authorities
    ///
    /// Fails with `NotFound` when the secret, the certificate, or the key is absent.
    async fn get_ca(
        &self,
        namespace: &str,
        cluster: &str,
        kind: CaKind,
    ) -> Result<CertificateAuthority, Error>;

    /// Load the transport certificate issued to a pod
    async fn get_transport_cert(
        &self,
        namespace: &str,
        cluster: &str,
        pod: &str,
    ) -> Result<TransportCertificate, Error>;

    /// List pods matching a label selector; empty when none match
    async fn list_instances(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, Error>;

    /// Get the SearchCluster record as the store currently holds it
    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<SearchCluster, Error>;

    /// Get a service
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, Error>;

    /// Get the endpoints backing a service
    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Endpoints, Error>;

    /// Get one value of a secret as UTF-8
    ///
    /// Fails with `NotFound` when the secret is absent and `KeyMissing` when
    /// the key is.
    async fn get_secret_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, Error>;

    /// List the StatefulSets of a cluster
    async fn get_group_records(
        &self,
        namespace: &str,
        cluster: &str,
    ) -> Result<Vec<StatefulSet>, Error>;

    /// List persistent volume claims matching a label selector
    async fn list_volume_claims(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<PersistentVolumeClaim>, Error>;

    /// Replace a pod, returning the stored result
    ///
    /// Fails with `Conflict` when the pod changed since it was read.
    async fn update_instance(&self, pod: &Pod) -> Result<Pod, Error>;
}

/// Real state reader backed by a kube Client
pub struct KubeStateReader {
    client: Client,
}

impl KubeStateReader {
    /// Create a new KubeStateReader wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| classify_api_error(e, "Secret", &namespaced(namespace, name)))
    }
}

/// Extract a UTF-8 value from secret data
fn secret_value(secret: &Secret, namespace: &str, key: &str) -> Result<String, Error> {
    let name = namespaced(namespace, &secret.name_any());
    let bytes = secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .ok_or_else(|| Error::key_missing(&name, key))?;

    String::from_utf8(bytes.0.clone()).map_err(|e| {
        Error::serialization(format!("secret {name} key {key} is not UTF-8: {e}"))
    })
}

/// Extract a certificate/key pair, reporting any absent half as `NotFound`
fn pem_pair(
    secret: &Secret,
    namespace: &str,
    cert_key: &str,
    private_key_key: &str,
) -> Result<(String, String), Error> {
    let lookup = |key: &str| match secret_value(secret, namespace, key) {
        Err(Error::KeyMissing { secret, key }) => {
            Err(Error::not_found("certificate data", format!("{secret}[{key}]")))
        }
        other => other,
    };
    Ok((lookup(cert_key)?, lookup(private_key_key)?))
}

#[async_trait]
impl StateReader for KubeStateReader {
    async fn get_ca(
        &self,
        namespace: &str,
        cluster: &str,
        kind: CaKind,
    ) -> Result<CertificateAuthority, Error> {
        let secret = self
            .get_secret(namespace, &ca_secret_name(cluster, kind))
            .await?;
        let (cert, key) = pem_pair(&secret, namespace, CERT_KEY, PRIVATE_KEY_KEY)?;
        Ok(CertificateAuthority::from_pem(&cert, &key)?)
    }

    async fn get_transport_cert(
        &self,
        namespace: &str,
        cluster: &str,
        pod: &str,
    ) -> Result<TransportCertificate, Error> {
        let secret = self
            .get_secret(namespace, &transport_certs_secret_name(cluster))
            .await?;
        let (cert_key, private_key_key) = transport_cert_keys(pod);
        let (cert, key) = pem_pair(&secret, namespace, &cert_key, &private_key_key)?;
        Ok(TransportCertificate::from_pem(&cert, &key)?)
    }

    async fn list_instances(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>, Error> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pods = api.list(&ListParams::default().labels(selector)).await?;
        trace!(namespace, selector, count = pods.items.len(), "listed pods");
        Ok(pods.items)
    }

    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<SearchCluster, Error> {
        let api: Api<SearchCluster> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| classify_api_error(e, "SearchCluster", &namespaced(namespace, name)))
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, Error> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| classify_api_error(e, "Service", &namespaced(namespace, name)))
    }

    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Endpoints, Error> {
        let api: Api<Endpoints> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| classify_api_error(e, "Endpoints", &namespaced(namespace, name)))
    }

    async fn get_secret_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<String, Error> {
        let secret = self.get_secret(namespace, name).await?;
        secret_value(&secret, namespace, key)
    }

    async fn get_group_records(
        &self,
        namespace: &str,
        cluster: &str,
    ) -> Result<Vec<StatefulSet>, Error> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().labels(&cluster_selector(cluster));
        Ok(api.list(&params).await?.items)
    }

    async fn list_volume_claims(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<PersistentVolumeClaim>, Error> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        let claims = api.list(&ListParams::default().labels(selector)).await?;
        trace!(namespace, selector, count = claims.items.len(), "listed volume claims");
        Ok(claims.items)
    }

    async fn update_instance(&self, pod: &Pod) -> Result<Pod, Error> {
        let namespace = pod.namespace().unwrap_or_default();
        let name = pod.name_any();
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);

        debug!(pod = %name, namespace = %namespace, "replacing pod");
        api.replace(&name, &PostParams::default(), pod)
            .await
            .map_err(|e| classify_api_error(e, "Pod", &namespaced(&namespace, &name)))
    }
}
