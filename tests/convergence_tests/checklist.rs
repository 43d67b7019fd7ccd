//! Stories about the standard checklist
//!
//! A test mutates a SearchCluster and then needs to know when the operator is
//! done. The checklist keeps polling while the store is still catching up and
//! only gives up, naming the step and what it last saw, when a step never
//! converges.

use std::time::Duration;

use lattice_verify::checks::Check;
use lattice_verify::crd::{ClusterHealth, NodeSet, StorageSpec};
use lattice_verify::naming::{admin_user_secret_name, http_service_name};
use lattice_verify::retry::ConvergenceConfig;
use lattice_verify::steps::{Step, StepList};
use lattice_verify::Error;

use super::fake_store::{endpoints, volume_claim, FakeStore, Snapshot};
use super::search_cluster;

fn config() -> ConvergenceConfig {
    ConvergenceConfig::new(Duration::from_secs(60), Duration::from_secs(1))
}

fn failed_step(err: &Error) -> &str {
    match err {
        Error::Step { step, .. } => step,
        other => panic!("Expected Step error, got {other:?}"),
    }
}

/// Story: the checklist starts while the operator has only issued
/// certificates, and passes once everything else shows up
#[tokio::test(start_paused = true)]
async fn checklist_waits_for_the_operator_to_finish() {
    let cluster = search_cluster(
        "8.11.1",
        vec![NodeSet::new("masters", 3), NodeSet::new("data", 2)],
    );
    let converged = Snapshot::converged(&cluster);

    let mut partial = Snapshot {
        secrets: converged.secrets.clone(),
        cluster: converged.cluster.clone(),
        ..Default::default()
    };
    partial.set_health(ClusterHealth::Red);

    let store = FakeStore::new(partial, 1);
    store.after(10, move |s| *s = converged);

    StepList::k8s_checks()
        .run(&cluster, &store, &config())
        .await
        .expect("cluster converges within the deadline");
}

/// Story: one node is never added to the service, so the run stops at the
/// endpoints step and later steps never run
#[tokio::test(start_paused = true)]
async fn run_stops_at_the_step_that_never_converges() {
    let cluster = search_cluster("8.11.1", vec![NodeSet::new("data", 5)]);
    let mut snapshot = Snapshot::converged(&cluster);
    snapshot
        .endpoints
        .insert(http_service_name("logs"), endpoints(4));
    // the password step would fail differently if it ever ran
    snapshot.secrets.remove(&admin_user_secret_name("logs"));

    let store = FakeStore::new(snapshot, 1);
    let err = StepList::k8s_checks()
        .run(&cluster, &store, &config())
        .await
        .expect_err("endpoints stay short");

    assert_eq!(failed_step(&err), "Services should have endpoints");
    assert!(err.to_string().ends_with("expected 5, got 4"));
}

/// Story: health stays yellow, and the error after the deadline says so
#[tokio::test(start_paused = true)]
async fn timeout_reports_the_last_observation() {
    let cluster = search_cluster("8.11.1", vec![NodeSet::new("data", 2)]);
    let mut snapshot = Snapshot::converged(&cluster);
    snapshot.set_health(ClusterHealth::Yellow);

    let store = FakeStore::new(snapshot, 1);
    let err = StepList::k8s_checks()
        .run(&cluster, &store, &config())
        .await
        .expect_err("health stays yellow");

    assert_eq!(failed_step(&err), "Cluster health should eventually be green");
    assert!(matches!(err.root(), Error::Mismatch { .. }));
    assert!(err.to_string().ends_with("expected green, got yellow"));
}

/// Story: a node set is renamed with the same count; the old pods linger until
/// the operator replaces them, so matching counts alone do not pass
#[tokio::test(start_paused = true)]
async fn renamed_node_set_waits_for_new_pods() {
    let before = search_cluster("8.11.1", vec![NodeSet::new("data", 2)]);
    let after = search_cluster("8.11.1", vec![NodeSet::new("hot", 2)]);

    let store = FakeStore::new(Snapshot::converged(&before), 1);
    let steps = StepList::from(vec![Step::new(
        "Expected pods should eventually be ready",
        Check::ExpectedInstancesReady,
    )]);

    let short = ConvergenceConfig::new(Duration::from_secs(3), Duration::from_secs(1));
    let err = steps
        .run(&after, &store, &short)
        .await
        .expect_err("old pods still there");
    assert!(err.to_string().contains("logs-sc-data"));

    let renamed = Snapshot::converged(&after);
    store.after(5, move |s| *s = renamed);
    steps
        .run(&after, &store, &config())
        .await
        .expect("new pods replace the old ones");
}

/// Story: pods are created Pending and the test waits for them to run
#[tokio::test(start_paused = true)]
async fn pods_eventually_reach_the_requested_phase() {
    let cluster = search_cluster("8.11.1", vec![NodeSet::new("data", 3)]);
    let running = Snapshot::converged(&cluster);

    let mut pending = running.clone();
    for pod in pending.pods.values_mut() {
        if let Some(status) = pod.status.as_mut() {
            status.phase = Some("Pending".to_string());
        }
    }

    let store = FakeStore::new(pending, 1);
    store.after(4, move |s| *s = running);

    StepList::pods_in_phase("Running")
        .run(&cluster, &store, &config())
        .await
        .expect("pods start running");
    assert!(store
        .peek()
        .pods
        .values()
        .all(|p| p.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running")));
}

fn fast_storage(count: u32) -> NodeSet {
    NodeSet {
        storage: Some(StorageSpec {
            size: "50Gi".to_string(),
            storage_class_name: Some("fast-ssd".to_string()),
        }),
        ..NodeSet::new("data", count)
    }
}

/// Story: data claims are bound a moment after the pods start, and the
/// checklist waits for them
#[tokio::test(start_paused = true)]
async fn checklist_waits_for_data_volumes() {
    let cluster = search_cluster("8.11.1", vec![NodeSet::new("masters", 1), fast_storage(2)]);
    let converged = Snapshot::converged(&cluster);
    assert_eq!(converged.volume_claims.len(), 2);

    let mut unbound = converged.clone();
    unbound.volume_claims.clear();
    let store = FakeStore::new(unbound, 1);
    store.after(30, move |s| *s = converged);

    StepList::k8s_checks()
        .run(&cluster, &store, &config())
        .await
        .expect("claims show up");
}

/// Story: the operator provisioned one claim on the default class; the run
/// fails at the data volume step and names the claim
#[tokio::test(start_paused = true)]
async fn claim_on_the_wrong_class_fails_the_run() {
    let cluster = search_cluster("8.11.1", vec![fast_storage(2)]);
    let mut snapshot = Snapshot::converged(&cluster);
    snapshot.volume_claims.insert(
        "search-data-logs-sc-data-1".to_string(),
        volume_claim("logs-sc-data", "search-data-logs-sc-data-1", "standard"),
    );

    let store = FakeStore::new(snapshot, 1);
    let err = StepList::k8s_checks()
        .run(&cluster, &store, &config())
        .await
        .expect_err("class never matches");

    assert_eq!(
        failed_step(&err),
        "Data volumes should have the requested storage class"
    );
    assert!(err
        .to_string()
        .ends_with("search-data-logs-sc-data-1: expected fast-ssd, got standard"));
}
