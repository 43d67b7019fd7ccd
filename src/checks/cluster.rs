//! Cluster-level checks: reported health and the admin credentials

use super::ClusterRef;
use crate::crd::{ClusterHealth, SearchCluster};
use crate::naming::{admin_user_secret_name, namespaced, ADMIN_USERNAME};
use crate::reader::StateReader;
use crate::{Error, Result};

/// The stored cluster reports green health
///
/// The cluster is re-read on every attempt; the health in `cluster` is the
/// caller's copy and may be arbitrarily old.
pub async fn check_cluster_health(cluster: &SearchCluster, reader: &dyn StateReader) -> Result<()> {
    let id = ClusterRef::of(cluster);
    let stored = reader.get_cluster(&id.namespace, &id.name).await?;
    let health = stored.status.map(|s| s.health).unwrap_or_default();

    if health != ClusterHealth::Green {
        return Err(Error::mismatch(
            format!("health of cluster {}", namespaced(&id.namespace, &id.name)),
            ClusterHealth::Green,
            health,
        ));
    }
    Ok(())
}

/// The admin user secret holds a non-empty password
pub async fn check_admin_password(cluster: &SearchCluster, reader: &dyn StateReader) -> Result<()> {
    let id = ClusterRef::of(cluster);
    let secret = admin_user_secret_name(&id.name);
    let password = reader
        .get_secret_value(&id.namespace, &secret, ADMIN_USERNAME)
        .await?;

    if password.is_empty() {
        return Err(Error::mismatch(
            format!(
                "password length in secret {}",
                namespaced(&id.namespace, &secret)
            ),
            "at least 1",
            0,
        ));
    }
    Ok(())
}
