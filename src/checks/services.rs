//! Service and endpoint checks

use super::ClusterRef;
use crate::crd::SearchCluster;
use crate::naming::{http_service_name, namespaced};
use crate::reader::StateReader;
use crate::{Error, Result};

/// Services the operator creates for a cluster
pub fn expected_services(cluster: &SearchCluster) -> Vec<String> {
    let id = ClusterRef::of(cluster);
    vec![http_service_name(&id.name)]
}

/// Services with the number of addresses each should be backed by
pub fn expected_endpoints(cluster: &SearchCluster) -> Vec<(String, u64)> {
    let id = ClusterRef::of(cluster);
    vec![(http_service_name(&id.name), cluster.spec.node_count())]
}

/// Every expected service exists
pub async fn check_services(cluster: &SearchCluster, reader: &dyn StateReader) -> Result<()> {
    let id = ClusterRef::of(cluster);
    for service in expected_services(cluster) {
        reader.get_service(&id.namespace, &service).await?;
    }
    Ok(())
}

/// Every expected service is backed by the expected number of addresses
pub async fn check_endpoints(cluster: &SearchCluster, reader: &dyn StateReader) -> Result<()> {
    let id = ClusterRef::of(cluster);
    check_endpoint_counts(&id.namespace, &expected_endpoints(cluster), reader).await
}

/// Compare endpoint address counts against expectations
///
/// An expectation of zero addresses is skipped without reading anything: it
/// stands for an optional component that is not deployed, whose endpoints may
/// not exist at all. Otherwise the endpoints must hold exactly one subset with
/// exactly the expected number of addresses.
pub async fn check_endpoint_counts(
    namespace: &str,
    expectations: &[(String, u64)],
    reader: &dyn StateReader,
) -> Result<()> {
    for (name, expected) in expectations {
        if *expected == 0 {
            continue;
        }

        let endpoints = reader.get_endpoints(namespace, name).await?;
        let subsets = endpoints.subsets.unwrap_or_default();
        let subject = format!("endpoints {}", namespaced(namespace, name));

        let [subset] = subsets.as_slice() else {
            return Err(Error::mismatch(
                format!("number of subsets of {subject}"),
                1,
                subsets.len(),
            ));
        };

        let addresses = subset.addresses.as_ref().map_or(0, Vec::len) as u64;
        if addresses != *expected {
            return Err(Error::mismatch(
                format!("number of addresses of {subject}"),
                expected,
                addresses,
            ));
        }
    }
    Ok(())
}
